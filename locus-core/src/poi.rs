use geo::Coord;

/// A named location managed by the store.
///
/// Coordinates are decimal degrees with `x = longitude` and `y = latitude`.
/// Identifiers are assigned by [`crate::LocationStore`] and never change once
/// a record exists.
///
/// With the `serde` feature the record serialises as a flat object with
/// `id`, `name`, `latitude` and `longitude` fields, which is the shape of
/// the persisted document.
///
/// # Examples
/// ```
/// use locus_core::PointOfInterest;
///
/// let poi = PointOfInterest::from_degrees(1, "Museum", 10.0, 20.0);
///
/// assert_eq!(poi.id, 1);
/// assert_eq!(poi.latitude(), 10.0);
/// assert_eq!(poi.longitude(), 20.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "PoiDocument", into = "PoiDocument")
)]
pub struct PointOfInterest {
    /// Store-assigned identifier, unique within the collection.
    pub id: u64,
    /// Display name; never empty once validated.
    pub name: String,
    /// Geospatial position.
    pub location: Coord<f64>,
}

impl PointOfInterest {
    /// Construct a `PointOfInterest` from a name and a position.
    ///
    /// No validation happens here; the store validates caller input through
    /// [`crate::PoiInput`] before a record is built.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }

    /// Construct a `PointOfInterest` from latitude and longitude in degrees.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use locus_core::PointOfInterest;
    ///
    /// let poi = PointOfInterest::from_degrees(3, "Harbour", 52.5, 13.4);
    /// assert_eq!(poi.location, Coord { x: 13.4, y: 52.5 });
    /// ```
    #[must_use]
    pub fn from_degrees(id: u64, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self::new(
            id,
            name,
            Coord {
                x: longitude,
                y: latitude,
            },
        )
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }
}

/// Flat persisted form of a [`PointOfInterest`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PoiDocument {
    id: u64,
    name: String,
    latitude: f64,
    longitude: f64,
}

#[cfg(feature = "serde")]
impl From<PoiDocument> for PointOfInterest {
    fn from(document: PoiDocument) -> Self {
        Self::from_degrees(
            document.id,
            document.name,
            document.latitude,
            document.longitude,
        )
    }
}

#[cfg(feature = "serde")]
impl From<PointOfInterest> for PoiDocument {
    fn from(poi: PointOfInterest) -> Self {
        Self {
            latitude: poi.latitude(),
            longitude: poi.longitude(),
            id: poi.id,
            name: poi.name,
        }
    }
}
