//! Column layout of a delimited stop feed.

/// Where the interesting fields live in a feed row
///
/// Column indices are zero-based. A row must have at least
/// [`FeedFormat::min_columns`] fields to be considered at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedFormat {
    pub delimiter: char,
    pub route_column: usize,
    pub stop_column: Option<usize>,
    pub latitude_column: usize,
    pub longitude_column: usize,
}

impl FeedFormat {
    /// CTA `CTA_STOP_XFERS.txt`: route, two descriptive fields, stop id, latitude, longitude
    pub const CTA_STOP_TRANSFERS: FeedFormat = FeedFormat {
        delimiter: ',',
        route_column: 0,
        stop_column: Some(3),
        latitude_column: 4,
        longitude_column: 5,
    };

    /// Smallest field count a row needs to reach every configured column
    pub fn min_columns(&self) -> usize {
        let highest = self
            .route_column
            .max(self.latitude_column)
            .max(self.longitude_column)
            .max(self.stop_column.unwrap_or(0));
        highest + 1
    }
}

impl Default for FeedFormat {
    fn default() -> Self {
        Self::CTA_STOP_TRANSFERS
    }
}
