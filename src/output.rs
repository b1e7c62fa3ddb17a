//! The module responsible for writing output data to disk.
use crate::resource::ResourceRecord;
use crate::scenario::{ScenarioConfig, ScenarioID};
use crate::simulation::ScenarioResult;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "bedcast_results";

/// The output file name for the SIR model's compartments
const SIR_FILE_NAME: &str = "sir.csv";

/// The output file name for resource occupancy
const OCCUPANCY_FILE_NAME: &str = "occupancy.csv";

/// The output file name for new admissions
const ADMISSIONS_FILE_NAME: &str = "admissions.csv";

/// The output file name for the census
const CENSUS_FILE_NAME: &str = "census.csv";

/// The output file name for scenario parameters
const SCENARIOS_FILE_NAME: &str = "scenarios.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// If the directory already exists and is not empty, it is only cleared if `allow_overwrite` is
/// true.
///
/// # Returns
///
/// True if an existing output directory was overwritten, false otherwise.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the SIR output CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SirRow {
    scenario_id: ScenarioID,
    day: u32,
    susceptible: f64,
    infections: f64,
    recovered: f64,
}

/// Represents a row in the occupancy, admissions and census output CSV files
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ResourceRow<T> {
    scenario_id: ScenarioID,
    day: u32,
    hosp: T,
    icu: T,
    vent: T,
}

impl<T: Copy> ResourceRow<T> {
    /// Create a new [`ResourceRow`]
    fn new(scenario_id: ScenarioID, record: &ResourceRecord<T>) -> Self {
        let values = record.values;
        Self {
            scenario_id,
            day: record.day,
            hosp: values.hosp,
            icu: values.icu,
            vent: values.vent,
        }
    }
}

/// Represents a row in the scenario parameters CSV file.
///
/// Rates are written as fractions, along with the values derived from them.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ScenarioRow {
    scenario_id: ScenarioID,
    name: String,
    population: f64,
    market_share: f64,
    initial_infections: f64,
    current_hosp: f64,
    n_days: u32,
    doubling_time: f64,
    relative_contact_rate: f64,
    recovery_days: f64,
    hosp_rate: f64,
    icu_rate: f64,
    vent_rate: f64,
    hosp_los: u32,
    icu_los: u32,
    vent_los: u32,
    total_infections: f64,
    detection_probability: f64,
    intrinsic_growth_rate: f64,
    beta: f64,
    gamma: f64,
    r_t: f64,
    r_naught: Option<f64>,
    doubling_time_t: Option<f64>,
}

impl ScenarioRow {
    /// Create a new [`ScenarioRow`]
    fn new(scenario: &ScenarioConfig, result: &ScenarioResult) -> Self {
        let params = &result.parameters;
        Self {
            scenario_id: scenario.id,
            name: scenario.name.clone(),
            population: scenario.population,
            market_share: scenario.market_share,
            initial_infections: scenario.initial_infections,
            current_hosp: scenario.current_hosp,
            n_days: scenario.n_days,
            doubling_time: scenario.doubling_time,
            relative_contact_rate: scenario.relative_contact_rate,
            recovery_days: scenario.recovery_days,
            hosp_rate: scenario.rates.hosp,
            icu_rate: scenario.rates.icu,
            vent_rate: scenario.rates.vent,
            hosp_los: scenario.length_of_stay.hosp,
            icu_los: scenario.length_of_stay.icu,
            vent_los: scenario.length_of_stay.vent,
            total_infections: params.total_infections,
            detection_probability: params.detection_probability,
            intrinsic_growth_rate: params.intrinsic_growth_rate,
            beta: params.beta,
            gamma: params.gamma,
            r_t: params.r_t,
            r_naught: params.r_naught,
            doubling_time_t: params.doubling_time_t,
        }
    }
}

/// An object for writing scenario results to file
pub struct DataWriter {
    sir_writer: csv::Writer<File>,
    occupancy_writer: csv::Writer<File>,
    admissions_writer: csv::Writer<File>,
    census_writer: csv::Writer<File>,
    scenarios_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            sir_writer: new_writer(SIR_FILE_NAME)?,
            occupancy_writer: new_writer(OCCUPANCY_FILE_NAME)?,
            admissions_writer: new_writer(ADMISSIONS_FILE_NAME)?,
            census_writer: new_writer(CENSUS_FILE_NAME)?,
            scenarios_writer: new_writer(SCENARIOS_FILE_NAME)?,
        })
    }

    /// Write all results for a scenario, with every row tagged with the scenario's ID
    pub fn write_scenario(
        &mut self,
        scenario: &ScenarioConfig,
        result: &ScenarioResult,
    ) -> Result<()> {
        let id = result.scenario_id;

        self.scenarios_writer
            .serialize(ScenarioRow::new(scenario, result))?;

        for record in &result.sir {
            let row = SirRow {
                scenario_id: id,
                day: record.day,
                susceptible: record.state.susceptible,
                infections: record.state.infected,
                recovered: record.state.recovered,
            };
            self.sir_writer.serialize(row)?;
        }

        write_resource_rows(&mut self.occupancy_writer, id, &result.occupancy)?;
        write_resource_rows(&mut self.admissions_writer, id, &result.admissions)?;
        write_resource_rows(&mut self.census_writer, id, &result.census)?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.sir_writer.flush()?;
        self.occupancy_writer.flush()?;
        self.admissions_writer.flush()?;
        self.census_writer.flush()?;
        self.scenarios_writer.flush()?;

        Ok(())
    }
}

/// Write per-day resource records to a CSV file
fn write_resource_rows<T>(
    writer: &mut csv::Writer<File>,
    scenario_id: ScenarioID,
    records: &[ResourceRecord<T>],
) -> Result<()>
where
    T: Copy + Serialize,
{
    for record in records {
        writer.serialize(ResourceRow::new(scenario_id, record))?;
    }

    Ok(())
}
