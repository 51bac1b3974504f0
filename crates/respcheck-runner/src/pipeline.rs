//! End-to-end check: load contract and fixtures, compare, aggregate, report

use std::path::PathBuf;

use respcheck_core::plan::{CheckPlan, Validation, ValidationStatus, validate_config};
use respcheck_core::{
    ApiGroup, Config, ContractReport, CsvReport, FixtureError, FixtureSet, FixtureSource,
    HtmlReport, JsonReport, KeyRules, ReportError, ReportRow, ReportSink, SkippedFixture, Summary,
    aggregate, evaluate_all, group_by_api,
};

use crate::contract::{ContractError, ContractIndex};
use crate::loader::DirFixtureLoader;

/// Result of one check run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Rows sorted by (api, fixture file)
    pub rows: Vec<ReportRow>,
    pub groups: Vec<ApiGroup>,
    pub summary: Summary,
    /// Fixtures whose comparison faulted
    pub errors: Vec<String>,
    /// Fixture files that could not be parsed
    pub skipped: Vec<SkippedFixture>,
}

impl RunOutput {
    #[must_use]
    pub fn report(&self) -> ContractReport {
        ContractReport::new(self.summary, self.groups.clone())
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.summary.exit_code()
    }
}

/// Contract checker over a contract directory and a fixture tree
pub struct ContractRunner {
    config: Config,
    rules: KeyRules,
}

impl ContractRunner {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            rules: config.key_rules(),
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the contract into an expected-schema index.
    ///
    /// # Errors
    ///
    /// Returns error if the contract or a component cannot be loaded
    pub fn load_contract(&self) -> Result<ContractIndex, RunnerError> {
        let contract_path = self.config.contract_path();
        let contract = ContractIndex::load(
            &contract_path,
            &self.config.component_index_path(),
            &self.rules,
        )?;
        tracing::info!(
            entries = contract.entries.len(),
            path = %contract_path.display(),
            "loaded contract"
        );
        Ok(contract)
    }

    /// Load every fixture under the fixture directory.
    ///
    /// # Errors
    ///
    /// Returns error if the fixture directory cannot be read
    pub fn load_fixtures(&self) -> Result<FixtureSet, RunnerError> {
        let set = DirFixtureLoader::new(&self.config.fixture_dir, self.rules.clone()).load()?;
        tracing::info!(
            loaded = set.fixtures.len(),
            skipped = set.skipped.len(),
            "loaded fixtures"
        );
        Ok(set)
    }

    /// Run the check.
    ///
    /// All inputs are read before any comparison starts.
    ///
    /// # Errors
    ///
    /// Returns error if the contract or fixtures cannot be loaded, or no
    /// fixture could be parsed
    pub fn run(&self) -> Result<RunOutput, RunnerError> {
        let contract = self.load_contract()?;
        let fixtures = self.load_fixtures()?;

        if fixtures.fixtures.is_empty() {
            return Err(RunnerError::NoFixtures(
                self.config.fixture_dir.display().to_string(),
            ));
        }

        Ok(check(&contract, fixtures))
    }

    /// Cross-reference fixtures against the contract without comparing bodies.
    ///
    /// Load failures become `Error` validations in the plan.
    #[must_use]
    pub fn plan(&self) -> CheckPlan {
        let mut validations = validate_config(&self.config);

        let contract = match self.load_contract() {
            Ok(contract) => Some(contract),
            Err(e) => {
                validations.push(load_failure("contract", &e));
                None
            }
        };
        let fixtures = match self.load_fixtures() {
            Ok(fixtures) => Some(fixtures),
            Err(e) => {
                validations.push(load_failure("fixtures", &e));
                None
            }
        };

        match (contract, fixtures) {
            (Some(contract), Some(fixtures)) => {
                CheckPlan::build(&contract.entries, &fixtures, validations)
            }
            _ => CheckPlan::invalid(validations),
        }
    }

    /// Write every configured report. Returns the paths written.
    ///
    /// # Errors
    ///
    /// Returns error if a report cannot be written
    pub fn write_reports(&self, output: &RunOutput) -> Result<Vec<PathBuf>, RunnerError> {
        let mut sinks: Vec<(&PathBuf, Box<dyn ReportSink>)> = Vec::new();
        if let Some(path) = &self.config.html_path {
            sinks.push((path, Box::new(HtmlReport::new(path))));
        }
        if let Some(path) = &self.config.csv_path {
            sinks.push((path, Box::new(CsvReport::new(path))));
        }
        if let Some(path) = &self.config.json_path {
            sinks.push((path, Box::new(JsonReport::new(path))));
        }

        let report = output.report();
        let mut written = Vec::with_capacity(sinks.len());
        for (path, mut sink) in sinks {
            sink.write(&report)?;
            tracing::info!(path = %path.display(), "wrote report");
            written.push(path.clone());
        }

        Ok(written)
    }
}

/// Compare loaded fixtures against a loaded contract.
#[must_use]
pub fn check(contract: &ContractIndex, fixtures: FixtureSet) -> RunOutput {
    let evaluation = evaluate_all(&fixtures.fixtures, &contract.entries);
    let rows = aggregate(&evaluation.checked, &evaluation.findings);
    let groups = group_by_api(&rows);

    let errors: Vec<String> = evaluation.errors.iter().map(ToString::to_string).collect();
    let summary = Summary::from_rows(&rows, fixtures.skipped.len() + errors.len());

    RunOutput {
        rows,
        groups,
        summary,
        errors,
        skipped: fixtures.skipped,
    }
}

fn load_failure(check: &str, error: &RunnerError) -> Validation {
    Validation {
        check: check.into(),
        status: ValidationStatus::Error,
        message: format!("{check}: {error}"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("Fixture error: {0}")]
    Fixtures(#[from] FixtureError),
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    #[error("No valid fixtures under {0}")]
    NoFixtures(String),
}
