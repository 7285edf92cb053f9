//! Loosely typed caller input and its validation.
//!
//! Callers hand the store whatever they parsed from a query string or request
//! body. Numbers may arrive as JSON numbers or as text; the store owns the
//! coercion so that no caller needs to pre-validate.
//!
//! Coordinate policy: latitude and longitude must be finite and no smaller
//! than [`PoiInput::MIN_COORDINATE_DEGREES`]. Records are treated as unsigned
//! decimal degrees. Proximity queries accept any finite value.

use geo::Coord;

use crate::{PointOfInterest, ValidationError};

/// A number as supplied by a caller: either already numeric or still text.
///
/// With the `serde` feature this deserialises from either a JSON number or a
/// JSON string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum LooseNumber {
    /// A value that was numeric on arrival.
    Number(f64),
    /// A value that still needs parsing.
    Text(String),
}

impl LooseNumber {
    /// Return the value as a finite `f64`, if it is one.
    ///
    /// Text is trimmed before parsing. Empty text, unparsable text, `NaN` and
    /// infinities all yield `None`.
    ///
    /// # Examples
    /// ```
    /// use locus_core::LooseNumber;
    ///
    /// assert_eq!(LooseNumber::from(" 12.5 ").to_finite(), Some(12.5));
    /// assert_eq!(LooseNumber::from("abc").to_finite(), None);
    /// assert_eq!(LooseNumber::from("inf").to_finite(), None);
    /// ```
    #[must_use]
    pub fn to_finite(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for LooseNumber {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for LooseNumber {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for LooseNumber {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for LooseNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for LooseNumber {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn parse_field(field: Option<&LooseNumber>) -> Option<f64> {
    field.and_then(LooseNumber::to_finite)
}

/// Fields for creating or replacing a point of interest.
///
/// Every field is optional so that missing input is reported by validation
/// rather than by the caller's parser.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct PoiInput {
    /// Display name.
    pub name: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<LooseNumber>,
    /// Longitude in degrees.
    pub longitude: Option<LooseNumber>,
}

/// Input that passed [`PoiInput::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPoi {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Position with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
}

impl ValidPoi {
    /// Attach an identifier, producing a record.
    #[must_use]
    pub fn into_poi(self, id: u64) -> PointOfInterest {
        PointOfInterest::new(id, self.name, self.location)
    }
}

impl PoiInput {
    /// Smallest accepted coordinate value, in degrees.
    pub const MIN_COORDINATE_DEGREES: f64 = 0.0;

    /// Build an input with every field present.
    ///
    /// # Examples
    /// ```
    /// use locus_core::PoiInput;
    ///
    /// let input = PoiInput::new("Museum", "10.5", 20);
    /// let valid = input.validate().expect("valid input");
    /// assert_eq!(valid.location.y, 10.5);
    /// assert_eq!(valid.location.x, 20.0);
    /// ```
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        latitude: impl Into<LooseNumber>,
        longitude: impl Into<LooseNumber>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
        }
    }

    /// Replace the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the latitude.
    #[must_use]
    pub fn with_latitude(mut self, latitude: impl Into<LooseNumber>) -> Self {
        self.latitude = Some(latitude.into());
        self
    }

    /// Replace the longitude.
    #[must_use]
    pub fn with_longitude(mut self, longitude: impl Into<LooseNumber>) -> Self {
        self.longitude = Some(longitude.into());
        self
    }

    /// Check the input, stopping at the first failing rule.
    ///
    /// Rules run in order: the name must be non-blank, both coordinates must
    /// parse to finite numbers, and both must satisfy the coordinate policy.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] of the first rule that fails.
    pub fn validate(&self) -> Result<ValidPoi, ValidationError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::MissingName)?;

        let (Some(latitude), Some(longitude)) = (
            parse_field(self.latitude.as_ref()),
            parse_field(self.longitude.as_ref()),
        ) else {
            return Err(ValidationError::MissingCoordinates);
        };

        if !(Self::accepts_coordinate(latitude) && Self::accepts_coordinate(longitude)) {
            return Err(ValidationError::NegativeCoordinates);
        }

        Ok(ValidPoi {
            name: name.to_owned(),
            location: Coord {
                x: longitude,
                y: latitude,
            },
        })
    }

    fn accepts_coordinate(value: f64) -> bool {
        value >= Self::MIN_COORDINATE_DEGREES
    }
}

/// Parameters of a proximity search, as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct NearbyQuery {
    /// Latitude of the search centre in degrees.
    pub latitude: Option<LooseNumber>,
    /// Longitude of the search centre in degrees.
    pub longitude: Option<LooseNumber>,
    /// Inclusive search radius in kilometres.
    pub max_distance: Option<LooseNumber>,
}

/// A proximity search that passed [`NearbyQuery::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQueryParams {
    /// Search centre with `x = longitude`, `y = latitude`.
    pub origin: Coord<f64>,
    /// Inclusive search radius in kilometres.
    pub max_distance_km: f64,
}

impl NearbyQuery {
    /// Build a query with every parameter present.
    #[must_use]
    pub fn new(
        latitude: impl Into<LooseNumber>,
        longitude: impl Into<LooseNumber>,
        max_distance: impl Into<LooseNumber>,
    ) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            max_distance: Some(max_distance.into()),
        }
    }

    /// Check that every parameter is present and numeric.
    ///
    /// A negative radius is accepted and simply matches nothing.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidQueryParameter`] naming the first
    /// parameter that is missing or not a finite number.
    pub fn validate(&self) -> Result<NearbyQueryParams, ValidationError> {
        let latitude = Self::require(self.latitude.as_ref(), "latitude")?;
        let longitude = Self::require(self.longitude.as_ref(), "longitude")?;
        let max_distance_km = Self::require(self.max_distance.as_ref(), "maxDistance")?;
        Ok(NearbyQueryParams {
            origin: Coord {
                x: longitude,
                y: latitude,
            },
            max_distance_km,
        })
    }

    fn require(value: Option<&LooseNumber>, field: &'static str) -> Result<f64, ValidationError> {
        parse_field(value).ok_or(ValidationError::InvalidQueryParameter { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LooseNumber::from(3.5), Some(3.5))]
    #[case(LooseNumber::from("  7 "), Some(7.0))]
    #[case(LooseNumber::from("1e2"), Some(100.0))]
    #[case(LooseNumber::from(""), None)]
    #[case(LooseNumber::from("12abc"), None)]
    #[case(LooseNumber::from("NaN"), None)]
    #[case(LooseNumber::from(f64::INFINITY), None)]
    fn loose_numbers_parse_to_finite_values(
        #[case] input: LooseNumber,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(input.to_finite(), expected);
    }

    #[rstest]
    #[case(PoiInput::new("", 1, 2), ValidationError::MissingName)]
    #[case(PoiInput::new("   ", 1, 2), ValidationError::MissingName)]
    #[case(PoiInput::default().with_latitude(1).with_longitude(2), ValidationError::MissingName)]
    #[case(PoiInput::new("X", "abc", 2), ValidationError::MissingCoordinates)]
    #[case(PoiInput::default().with_name("X").with_latitude(1), ValidationError::MissingCoordinates)]
    #[case(PoiInput::new("X", -1, 2), ValidationError::NegativeCoordinates)]
    #[case(PoiInput::new("X", 1, "-0.5"), ValidationError::NegativeCoordinates)]
    fn rejects_invalid_input(#[case] input: PoiInput, #[case] expected: ValidationError) {
        assert_eq!(input.validate(), Err(expected));
    }

    #[rstest]
    fn name_is_checked_before_coordinates() {
        let input = PoiInput::default().with_name(" ").with_latitude("abc");
        assert_eq!(input.validate(), Err(ValidationError::MissingName));
    }

    #[rstest]
    fn missing_coordinates_win_over_negative_ones() {
        let input = PoiInput::new("X", -1, "abc");
        assert_eq!(input.validate(), Err(ValidationError::MissingCoordinates));
    }

    #[rstest]
    fn accepts_zero_and_trims_name() {
        let valid = PoiInput::new("  Origin  ", 0, "0")
            .validate()
            .expect("zero coordinates are allowed");
        assert_eq!(valid.name, "Origin");
        assert_eq!(valid.location, Coord { x: 0.0, y: 0.0 });
    }

    #[rstest]
    #[case(NearbyQuery { latitude: None, ..NearbyQuery::new(1, 2, 3) }, "latitude")]
    #[case(NearbyQuery::new(1, "east", 3), "longitude")]
    #[case(NearbyQuery { max_distance: Some(LooseNumber::from("")), ..NearbyQuery::new(1, 2, 3) }, "maxDistance")]
    fn nearby_query_names_the_bad_parameter(
        #[case] query: NearbyQuery,
        #[case] field: &'static str,
    ) {
        assert_eq!(
            query.validate(),
            Err(ValidationError::InvalidQueryParameter { field })
        );
    }

    #[rstest]
    fn nearby_query_accepts_negative_coordinates() {
        let params = NearbyQuery::new(-33.9, "-18.4", "5")
            .validate()
            .expect("valid query");
        assert_eq!(params.origin, Coord { x: -18.4, y: -33.9 });
        assert_eq!(params.max_distance_km, 5.0);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_numbers_and_strings() {
        let input: PoiInput =
            serde_json::from_str(r#"{"name":"Cafe","latitude":"10.5","longitude":20}"#)
                .expect("decode input");
        assert_eq!(input, PoiInput::new("Cafe", "10.5", 20.0));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_query_with_camel_case_radius() {
        let query: NearbyQuery =
            serde_json::from_str(r#"{"latitude":"1","longitude":"2","maxDistance":"3"}"#)
                .expect("decode query");
        assert_eq!(query, NearbyQuery::new("1", "2", "3"));
    }
}
