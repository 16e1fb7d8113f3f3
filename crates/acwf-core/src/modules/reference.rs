use crate::domain::{AcwfError, AcwfResult, AlatMap};

/// Largest accepted relative difference between the two reference codes.
pub const MAX_REFERENCE_RELATIVE_DIFFERENCE: f64 = 0.01;
/// Below this relative difference the two datasets are treated as copies of each other.
pub const MIN_REFERENCE_RELATIVE_DIFFERENCE: f64 = 1.0e-14;

/// Averages two independent all-electron datasets into one reference map.
///
/// Both maps must cover exactly the same configurations and elements. A pair
/// missing in either dataset stays missing in the average.
pub fn average_reference_alats(first: &AlatMap, second: &AlatMap) -> AcwfResult<AlatMap> {
    if first.configurations() != second.configurations() {
        return Err(AcwfError::computation(
            "RUN.REFERENCE_KEYS",
            "reference datasets cover different configurations",
        ));
    }

    let mut average = AlatMap::new();
    for (configuration, first_elements) in first.iter() {
        let second_elements = second.elements(configuration).ok_or_else(|| {
            AcwfError::internal(
                "SYS.REFERENCE_KEYS",
                format!("configuration {} vanished from the second dataset", configuration),
            )
        })?;
        if !first_elements.keys().eq(second_elements.keys()) {
            return Err(AcwfError::computation(
                "RUN.REFERENCE_KEYS",
                format!(
                    "reference datasets cover different elements for {}",
                    configuration
                ),
            ));
        }

        for (element, first_value) in first_elements {
            let second_value = second_elements.get(element).copied().flatten();
            let (Some(a), Some(b)) = (*first_value, second_value) else {
                average.insert(configuration, element, None);
                continue;
            };

            let relative = ((a - b) / b).abs();
            if !(relative < MAX_REFERENCE_RELATIVE_DIFFERENCE) {
                return Err(AcwfError::computation(
                    "RUN.REFERENCE_DISAGREEMENT",
                    format!(
                        "data for {}-{} has large error: {} {} {}",
                        element, configuration, a, b, relative
                    ),
                ));
            }
            if !(relative > MIN_REFERENCE_RELATIVE_DIFFERENCE) {
                return Err(AcwfError::computation(
                    "RUN.REFERENCE_DUPLICATE",
                    format!(
                        "data for {}-{} seem to be really identical; maybe a copy-paste error?",
                        element, configuration
                    ),
                ));
            }
            average.insert(configuration, element, Some((a + b) / 2.0));
        }
    }
    Ok(average)
}
