//! Pettifor's Mendeleev numbers, a chemically ordered alternative to Z.

use super::elements::{MAX_ATOMIC_NUMBER, atomic_number_for_symbol, element_symbol};
use crate::domain::{AcwfError, AcwfResult};

/// Mendeleev number of each element, indexed by `Z - 1`.
const MENDELEEV_NUMBERS: [usize; MAX_ATOMIC_NUMBER] = [
    103, 1, 12, 77, 86, 95, 100, 101, 102, 2, 11, 73, 80, 85, 90, 94, 99, 3, 10, 16, 19, 51, 54,
    57, 60, 61, 64, 67, 72, 76, 81, 84, 89, 93, 98, 4, 9, 15, 25, 49, 53, 56, 59, 62, 65, 69, 71,
    75, 79, 83, 88, 92, 97, 5, 8, 14, 33, 32, 31, 30, 29, 28, 18, 27, 26, 24, 23, 22, 21, 17, 20,
    50, 52, 55, 58, 63, 66, 68, 70, 74, 78, 82, 87, 91, 96, 6, 7, 13, 48, 47, 46, 45, 44, 43, 42,
    41, 40, 39, 38, 37, 36, 35, 34,
];

#[derive(Debug, Clone)]
pub struct MendeleevScale {
    rank_by_atomic_number: Vec<usize>,
    atomic_number_by_rank: Vec<Option<usize>>,
}

impl MendeleevScale {
    pub fn new() -> AcwfResult<Self> {
        Self::from_ranks(&MENDELEEV_NUMBERS)
    }

    /// Builds the scale from ranks listed in atomic-number order.
    ///
    /// Ranks must be distinct; the inverse table is sized by the largest rank.
    pub fn from_ranks(ranks: &[usize]) -> AcwfResult<Self> {
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        let mut atomic_number_by_rank = vec![None; max_rank + 1];

        for (index, &rank) in ranks.iter().enumerate() {
            let atomic_number = index + 1;
            if rank == 0 {
                return Err(AcwfError::internal(
                    "SYS.MENDELEEV_TABLE",
                    format!("Mendeleev number of Z={} must be positive", atomic_number),
                ));
            }
            if let Some(previous) = atomic_number_by_rank[rank].replace(atomic_number) {
                return Err(AcwfError::internal(
                    "SYS.MENDELEEV_TABLE",
                    format!(
                        "duplicate Mendeleev number {} for Z={} and Z={}",
                        rank, previous, atomic_number
                    ),
                ));
            }
        }

        Ok(Self {
            rank_by_atomic_number: ranks.to_vec(),
            atomic_number_by_rank,
        })
    }

    pub fn max_rank(&self) -> usize {
        self.atomic_number_by_rank.len().saturating_sub(1)
    }

    pub fn rank_for_atomic_number(&self, atomic_number: usize) -> Option<usize> {
        atomic_number
            .checked_sub(1)
            .and_then(|index| self.rank_by_atomic_number.get(index))
            .copied()
    }

    pub fn rank_for_symbol(&self, symbol: &str) -> Option<usize> {
        self.rank_for_atomic_number(atomic_number_for_symbol(symbol)?)
    }

    pub fn atomic_number_for_rank(&self, rank: usize) -> Option<usize> {
        self.atomic_number_by_rank.get(rank).copied().flatten()
    }

    pub fn symbol_for_rank(&self, rank: usize) -> Option<&'static str> {
        element_symbol(self.atomic_number_for_rank(rank)?)
    }
}
