//! Upcoming weather preparation.
//!
//! Joins forecast rows against the static weather description lookup and
//! filters them to the resolved ZIP code from today onward, producing a
//! chart-ready day list. Rendering stays with the presentation layer.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use location_insights_insights_models::{ForecastDay, ForecastRow, WeatherDescription};

use crate::{ReportError, UpcomingWeather};

/// Loads the weather description lookup CSV (`code,label,icon`).
///
/// # Errors
///
/// Returns [`ReportError::DataUnavailable`] if the file cannot be read.
pub fn load_descriptions(
    path: &Path,
) -> Result<BTreeMap<String, WeatherDescription>, ReportError> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::DataUnavailable {
        message: format!("weather descriptions at {}: {e}", path.display()),
    })?;
    load_descriptions_from_reader(file)
}

/// Loads the weather description lookup from any reader.
///
/// # Errors
///
/// Returns [`ReportError::DataUnavailable`] if the CSV cannot be parsed.
pub fn load_descriptions_from_reader<R: Read>(
    reader: R,
) -> Result<BTreeMap<String, WeatherDescription>, ReportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut descriptions = BTreeMap::new();
    for result in csv_reader.deserialize::<DescriptionRow>() {
        let row = result.map_err(|e| ReportError::DataUnavailable {
            message: format!("weather description row: {e}"),
        })?;
        descriptions.insert(
            row.code.clone(),
            WeatherDescription {
                code: row.code,
                label: row.label,
                icon: row.icon,
            },
        );
    }

    Ok(descriptions)
}

#[derive(Debug, serde::Deserialize)]
struct DescriptionRow {
    code: String,
    label: String,
    icon: Option<String>,
}

/// Builds the upcoming weather view for one ZIP code.
///
/// Keeps rows for `zipcode` dated `today` or later, resolves each row's
/// description code against the lookup (rows with unknown codes are
/// dropped), and returns the days in ascending date order.
#[must_use]
pub fn upcoming_weather(
    forecast: &[ForecastRow],
    descriptions: &BTreeMap<String, WeatherDescription>,
    zipcode: &str,
    today: NaiveDate,
) -> UpcomingWeather {
    let mut days: Vec<ForecastDay> = forecast
        .iter()
        .filter(|row| row.zipcode == zipcode && row.date >= today)
        .filter_map(|row| {
            let Some(description) = descriptions.get(&row.description_code) else {
                log::debug!(
                    "Dropping forecast row for {zipcode} on {}: unknown code '{}'",
                    row.date,
                    row.description_code
                );
                return None;
            };
            Some(ForecastDay {
                date: row.date,
                avg_temp: row.avg_temp,
                min_temp: row.min_temp,
                max_temp: row.max_temp,
                label: description.label.clone(),
                icon: description.icon.clone(),
            })
        })
        .collect();

    days.sort_by_key(|day| day.date);

    UpcomingWeather {
        zipcode: zipcode.to_string(),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC_CSV: &str = "\
code,label,icon
SUNNY,Sunny,icons/sunny.png
CLOUDY,Partly cloudy,icons/cloudy.png
RAIN,Rain showers,
";

    fn row(zipcode: &str, date: (i32, u32, u32), code: &str) -> ForecastRow {
        ForecastRow {
            zipcode: zipcode.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            avg_temp: 80.0,
            min_temp: 71.0,
            max_temp: 89.0,
            description_code: code.to_string(),
        }
    }

    #[test]
    fn loads_description_lookup() {
        let descriptions = load_descriptions_from_reader(DESC_CSV.as_bytes()).unwrap();
        assert_eq!(descriptions.len(), 3);
        assert_eq!(descriptions["CLOUDY"].label, "Partly cloudy");
        assert!(descriptions["RAIN"].icon.is_none());
    }

    #[test]
    fn filters_by_zipcode_and_date_then_sorts() {
        let descriptions = load_descriptions_from_reader(DESC_CSV.as_bytes()).unwrap();
        let forecast = vec![
            row("20007", (2026, 8, 9), "CLOUDY"),
            row("20007", (2026, 8, 5), "SUNNY"),
            row("20007", (2026, 8, 7), "SUNNY"),
            row("60602", (2026, 8, 8), "RAIN"),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let weather = upcoming_weather(&forecast, &descriptions, "20007", today);
        assert_eq!(weather.zipcode, "20007");
        let dates: Vec<NaiveDate> = weather.days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 9).unwrap(),
            ]
        );
        assert_eq!(weather.days[1].label, "Partly cloudy");
    }

    #[test]
    fn unknown_description_codes_are_dropped() {
        let descriptions = load_descriptions_from_reader(DESC_CSV.as_bytes()).unwrap();
        let forecast = vec![
            row("20007", (2026, 8, 7), "HAIL"),
            row("20007", (2026, 8, 8), "SUNNY"),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let weather = upcoming_weather(&forecast, &descriptions, "20007", today);
        assert_eq!(weather.days.len(), 1);
        assert_eq!(weather.days[0].label, "Sunny");
    }
}
