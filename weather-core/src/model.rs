use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Current conditions for one location, in the shape the group endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWeatherRecord {
    pub coord: Coord,
    /// Observation time, unix seconds.
    pub dt: i64,
    pub id: u64,
    pub name: String,
    pub main: MainMeasurements,
    /// Meters.
    pub visibility: u32,
    #[serde(deserialize_with = "non_empty")]
    pub weather: Vec<Condition>,
    pub wind: Wind,
    pub clouds: Clouds,
    pub sys: SysInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainMeasurements {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grnd_level: Option<f64>,
    pub humidity: f64,
}

/// One weather phenomenon, e.g. `800 / Clear / clear sky / 01d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysInfo {
    pub country: String,
    /// Shift from UTC in seconds.
    pub timezone: i32,
    pub sunrise: i64,
    pub sunset: i64,
}

impl LocationWeatherRecord {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.dt, 0)
    }

    pub fn sunrise_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sys.sunrise, 0)
    }

    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sys.sunset, 0)
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Vec::<Condition>::deserialize(deserializer)?;
    if conditions.is_empty() {
        return Err(D::Error::custom("`weather` must contain at least one condition"));
    }
    Ok(conditions)
}

/// Observable outcome of a fetch cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchResult {
    #[default]
    Loading,
    Error(String),
    Ready(Vec<LocationWeatherRecord>),
}

impl FetchResult {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchResult::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchResult::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Records of a `Ready` state; empty otherwise.
    pub fn records(&self) -> &[LocationWeatherRecord] {
        match self {
            FetchResult::Ready(records) => records,
            _ => &[],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const KYIV_JSON: &str = r#"{
        "coord": {"lon": 30.5167, "lat": 50.4333},
        "sys": {"country": "UA", "timezone": 7200, "sunrise": 1700110000, "sunset": 1700142000},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 5, "feels_like": 2.1, "temp_min": 4, "temp_max": 6,
                 "pressure": 1015, "sea_level": 1015, "grnd_level": 998, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 240},
        "clouds": {"all": 0},
        "dt": 1700125000,
        "id": 703448,
        "name": "Kyiv"
    }"#;

    pub(crate) fn record(id: u64, name: &str) -> LocationWeatherRecord {
        let mut rec: LocationWeatherRecord =
            serde_json::from_str(KYIV_JSON).expect("fixture must parse");
        rec.id = id;
        rec.name = name.to_string();
        rec
    }

    #[test]
    fn parses_wire_shape() {
        let rec: LocationWeatherRecord = serde_json::from_str(KYIV_JSON).unwrap();

        assert_eq!(rec.name, "Kyiv");
        assert_eq!(rec.id, 703448);
        assert_eq!(rec.main.temp, 5.0);
        assert_eq!(rec.main.grnd_level, Some(998.0));
        assert_eq!(rec.sys.country, "UA");
        assert_eq!(rec.primary_condition().map(|c| c.main.as_str()), Some("Clear"));
    }

    #[test]
    fn missing_pressure_levels_are_tolerated() {
        let json = KYIV_JSON
            .replace(r#""sea_level": 1015, "grnd_level": 998, "#, "");
        let rec: LocationWeatherRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(rec.main.sea_level, None);
        assert_eq!(rec.main.grnd_level, None);
    }

    #[test]
    fn empty_conditions_are_rejected() {
        let json = KYIV_JSON.replace(
            r#"[{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}]"#,
            "[]",
        );
        let err = serde_json::from_str::<LocationWeatherRecord>(&json).unwrap_err();

        assert!(err.to_string().contains("at least one condition"));
    }

    #[test]
    fn icon_url_uses_primary_condition() {
        let rec = record(703448, "Kyiv");
        let url = rec.primary_condition().map(Condition::icon_url);

        assert_eq!(url.as_deref(), Some("https://openweathermap.org/img/wn/01d@2x.png"));
    }

    #[test]
    fn timestamps_convert_to_utc() {
        let rec = record(703448, "Kyiv");

        assert_eq!(rec.observed_at().map(|t| t.timestamp()), Some(1700125000));
        assert!(rec.sunrise_at() < rec.sunset_at());
    }

    #[test]
    fn non_ready_states_expose_no_records() {
        assert!(FetchResult::Loading.records().is_empty());
        assert!(FetchResult::Error("boom".into()).records().is_empty());
        assert_eq!(FetchResult::Error("boom".into()).error(), Some("boom"));
        assert!(FetchResult::default().is_loading());

        let ready = FetchResult::Ready(vec![record(1, "A")]);
        assert_eq!(ready.records().len(), 1);
        assert_eq!(ready.error(), None);
    }
}
