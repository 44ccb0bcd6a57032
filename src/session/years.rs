use log::debug;

use crate::errors::TrailheatError;

/// The user's current choice: one concrete year or the "All" sentinel that
/// aggregates across every year in the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum YearSelection {
    #[default]
    All,
    Year(i32),
}

impl YearSelection {
    pub fn label(&self) -> String {
        match self {
            YearSelection::All => "All".to_string(),
            YearSelection::Year(year) => year.to_string(),
        }
    }
}

/// Years available for the current session plus the current selection.
/// Options are fully replaced on repopulation, never appended to.
#[derive(Debug, Default)]
pub struct YearSelector {
    years: Vec<i32>,
    selection: YearSelection,
}

impl YearSelector {
    /// Replaces every option with `years`, preserving their ordering, and
    /// resets the selection to `All`. Calling this twice with the same
    /// input leaves the selector unchanged.
    pub fn populate(&mut self, years: Vec<i32>) {
        debug!("populating year selector with {} years", years.len());
        self.years = years;
        self.selection = YearSelection::All;
    }

    pub fn available(&self) -> &[i32] {
        &self.years
    }

    pub fn selection(&self) -> YearSelection {
        self.selection
    }

    /// Updates the selection. A concrete year must be one of the available
    /// options; `All` is always accepted.
    pub fn select(&mut self, selection: YearSelection) -> Result<(), TrailheatError> {
        if let YearSelection::Year(year) = selection
            && !self.years.contains(&year)
        {
            return Err(TrailheatError::UnknownYear { year });
        }
        self.selection = selection;
        Ok(())
    }

    /// Whether the current selection is still valid against the available
    /// options.
    pub fn selection_is_known(&self) -> bool {
        match self.selection {
            YearSelection::All => true,
            YearSelection::Year(year) => self.years.contains(&year),
        }
    }
}
