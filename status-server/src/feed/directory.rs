//! Fixed station directory.

use crate::domain::StationCode;

/// Display identity of a station: its name and the city it is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationIdentity {
    pub name: String,
    pub city: String,
}

/// Known stations: code, display name, city.
const KNOWN_STATIONS: &[(&str, &str, &str)] = &[
    ("NDLS", "New Delhi Railway Station", "New Delhi"),
    ("BCT", "Mumbai Central", "Mumbai"),
    ("CSMT", "Chhatrapati Shivaji Maharaj Terminus", "Mumbai"),
    ("HWH", "Howrah Junction", "Kolkata"),
    ("MAS", "Chennai Central", "Chennai"),
    ("SBC", "KSR Bengaluru City Junction", "Bengaluru"),
    ("PUNE", "Pune Junction", "Pune"),
    ("ADI", "Ahmedabad Junction", "Ahmedabad"),
    ("JP", "Jaipur Junction", "Jaipur"),
    ("LKO", "Lucknow Charbagh", "Lucknow"),
    ("PNBE", "Patna Junction", "Patna"),
    ("BPL", "Bhopal Junction", "Bhopal"),
];

/// Look up a station's display identity.
///
/// Codes outside the directory still get an identity: the board must
/// render for any syntactically valid code, so unknown stations fall back
/// to `"<CODE> Station"` in an `"Unknown"` city.
///
/// # Examples
///
/// ```
/// use status_server::domain::StationCode;
/// use status_server::feed::station_identity;
///
/// let ndls = station_identity(&StationCode::parse("NDLS").unwrap());
/// assert_eq!(ndls.name, "New Delhi Railway Station");
/// assert_eq!(ndls.city, "New Delhi");
///
/// let other = station_identity(&StationCode::parse("QQZ").unwrap());
/// assert_eq!(other.name, "QQZ Station");
/// assert_eq!(other.city, "Unknown");
/// ```
pub fn station_identity(code: &StationCode) -> StationIdentity {
    for (known, name, city) in KNOWN_STATIONS {
        if code.as_str() == *known {
            return StationIdentity {
                name: (*name).to_string(),
                city: (*city).to_string(),
            };
        }
    }

    StationIdentity {
        name: format!("{} Station", code.as_str()),
        city: "Unknown".to_string(),
    }
}
