use super::CliError;
use super::helpers::*;
use acwf_core::domain::{AlatMap, ConfigurationFamily};
use acwf_core::modules::alat::{RawDataset, extract_alats};
use acwf_core::modules::eos::{
    CatalogStructureSource, SpoolWorkflowEngine, SubmissionConfig, submit_eos,
};
use acwf_core::modules::histogram::compare_alats;
use acwf_core::modules::plot::{
    element_axis, render_first_neighbor_plot, render_first_neighbor_subplots,
};
use acwf_core::modules::reference::average_reference_alats;
use acwf_core::modules::serialization::write_json_artifact;
use acwf_core::modules::series::AxisKind;
use std::fs;
use std::path::{Path, PathBuf};

const SET_USAGE: &str = "Pass either 'oxides' or 'unaries' on the command line.";
const SET_USAGE_EXIT_CODE: i32 = 2;

/// Label under which the WIEN2k reference joins the subplot methods.
const REFERENCE_FUNCTIONAL_LABEL: &str = "PBE";

#[derive(clap::Args)]
pub(super) struct PlotArgs {
    /// Benchmark set: unaries or oxides
    #[arg(value_name = "SET")]
    set: Option<String>,

    /// Folder holding labels.json and the published datasets
    #[arg(long, default_value = "../../../code-data")]
    data_folder: PathBuf,

    /// Pipeline config with extra functionals and the histogram pair
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving plots and JSON reports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also plot against Mendeleev's number
    #[arg(long)]
    mendeleev: bool,
}

#[derive(clap::Args)]
pub(super) struct SubmitEosArgs {
    /// Submission config: plugin, engine types and engine options
    #[arg(long)]
    config: PathBuf,

    /// JSON structure catalog to query
    #[arg(long, default_value = "structures.json")]
    catalog: PathBuf,

    /// Spool directory receiving submitted workflows
    #[arg(long, default_value = "eos-spool")]
    spool: PathBuf,
}

impl PlotArgs {
    fn axis_kinds(&self) -> &'static [AxisKind] {
        if self.mendeleev {
            &[AxisKind::AtomicNumber, AxisKind::Mendeleev]
        } else {
            &[AxisKind::AtomicNumber]
        }
    }
}

pub(super) fn print_set_usage() -> i32 {
    println!("{}", SET_USAGE);
    SET_USAGE_EXIT_CODE
}

pub(super) fn run_plot_command(args: PlotArgs) -> Result<i32, CliError> {
    let Some(family) = args
        .set
        .as_deref()
        .and_then(|set| set.parse::<ConfigurationFamily>().ok())
    else {
        return Ok(print_set_usage());
    };

    let labels: LabelsIndex =
        load_json_config(&args.data_folder.join(LABELS_FILE), "dataset index")?;
    let pipeline: PipelineConfig = match &args.config {
        Some(path) => load_json_config(path, "pipeline config")?,
        None => PipelineConfig::default(),
    };
    fs::create_dir_all(&args.output_dir).map_err(|source| {
        CliError::Internal(anyhow::anyhow!(
            "failed to create output directory '{}': {}",
            args.output_dir.display(),
            source
        ))
    })?;

    let references = ReferenceDatasets {
        fleur: load_reference(&labels, ReferenceCode::Fleur, family, &args.data_folder)?,
        wien2k: load_reference(&labels, ReferenceCode::Wien2k, family, &args.data_folder)?,
    };
    let fleur_alats = extract_alats(&references.fleur).map_err(CliError::Compute)?;
    let wien2k_alats = extract_alats(&references.wien2k).map_err(CliError::Compute)?;

    let mut functionals = vec![(REFERENCE_FUNCTIONAL_LABEL.to_string(), wien2k_alats.clone())];
    for spec in &pipeline.functionals {
        let alats = load_dataset_alats(spec, &args.data_folder, &references)?;
        functionals.push((spec.label.clone(), alats));
    }
    for (label, alats) in &functionals {
        dump_alats(&args.output_dir, label, alats)?;
    }

    let reference = average_reference_alats(&fleur_alats, &wien2k_alats).map_err(CliError::Compute)?;
    for &kind in args.axis_kinds() {
        let axis = element_axis(kind).map_err(CliError::Compute)?;
        let path = render_first_neighbor_plot(&reference, &axis, &args.output_dir)
            .map_err(CliError::Compute)?;
        println!("{}", written_line(&path));
    }
    for &kind in args.axis_kinds() {
        let axis = element_axis(kind).map_err(CliError::Compute)?;
        let path = render_first_neighbor_subplots(&functionals, &axis, &args.output_dir)
            .map_err(CliError::Compute)?;
        println!("{}", written_line(&path));
    }

    if let Some(pair) = &pipeline.histogram {
        let a = load_dataset_alats(&pair.a, &args.data_folder, &references)?;
        let b = load_dataset_alats(&pair.b, &args.data_folder, &references)?;
        let comparison =
            compare_alats(&pair.a.label, &a, &pair.b.label, &b).map_err(CliError::Compute)?;

        comparison
            .write_report(&args.output_dir)
            .map_err(CliError::Compute)?;
        for line in comparison.summary_lines() {
            println!("{}", line);
        }
        let path = comparison
            .render_histogram(&args.output_dir)
            .map_err(CliError::Compute)?;
        println!("{}", written_line(&path));
    }

    Ok(0)
}

fn load_reference(
    labels: &LabelsIndex,
    code: ReferenceCode,
    family: ConfigurationFamily,
    data_folder: &Path,
) -> Result<RawDataset, CliError> {
    let path = resolve_data_path(data_folder, &labels.dataset_path(code, family)?);
    tracing::info!(code = code.as_str(), path = %path.display(), "loading reference dataset");
    RawDataset::load(&path).map_err(CliError::Compute)
}

fn dump_alats(output_dir: &Path, label: &str, alats: &AlatMap) -> Result<(), CliError> {
    let path = output_dir.join(format!("{}_alats.json", label_slug(label)));
    write_json_artifact(&path, alats).map_err(CliError::Compute)?;
    tracing::debug!(path = %path.display(), "wrote lattice parameters");
    Ok(())
}

pub(super) fn run_submit_eos_command(args: SubmitEosArgs) -> Result<i32, CliError> {
    let config: SubmissionConfig = load_json_config(&args.config, "submission config")?;
    let source = CatalogStructureSource::load(&args.catalog).map_err(CliError::Compute)?;
    let engine = SpoolWorkflowEngine::new(args.spool);

    let handle = submit_eos(&config, &source, &engine).map_err(CliError::Compute)?;
    println!("Submitted EOS WorkChain with pk {}", handle.pk);
    Ok(0)
}
