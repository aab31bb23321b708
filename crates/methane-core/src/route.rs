//! Shareable URL form of the view: `/year/{year}?lat={lat}&lng={lng}&zoom={zoom}`,
//! optionally under a base path.

use std::fmt::Write as _;

use crate::config::ViewState;

const YEAR_SEGMENT: &str = "year";

/// The parts of application state that survive in a URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub year: Option<i32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub zoom: Option<f64>,
}

impl Route {
    pub fn new(year: i32, lat: f64, lng: f64, zoom: f64) -> Self {
        Self {
            year: Some(year),
            lat: Some(lat),
            lng: Some(lng),
            zoom: Some(zoom),
        }
    }

    pub fn from_view(year: i32, view: &ViewState) -> Self {
        Self::new(year, view.latitude, view.longitude, view.zoom)
    }

    /// `(lat, lng, zoom)` when all three are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64, f64)> {
        match (self.lat, self.lng, self.zoom) {
            (Some(lat), Some(lng), Some(zoom)) => Some((lat, lng, zoom)),
            _ => None,
        }
    }

    /// Apply the route's coordinates to `view`, keeping bearing and pitch.
    pub fn apply_to(&self, view: ViewState) -> ViewState {
        match self.coordinates() {
            Some((latitude, longitude, zoom)) => ViewState {
                latitude,
                longitude,
                zoom,
                ..view
            },
            None => view,
        }
    }

    /// Render as a path plus query. Floats use their shortest round-trip form,
    /// so [`Route::parse`] recovers them exactly.
    pub fn to_url(&self, base_path: &str) -> String {
        let mut url = base_path.trim_end_matches('/').to_string();
        if let Some(year) = self.year {
            let _ = write!(url, "/{YEAR_SEGMENT}/{year}");
        }
        if url.is_empty() {
            url.push('/');
        }
        let params = [("lat", self.lat), ("lng", self.lng), ("zoom", self.zoom)];
        let mut sep = '?';
        for (key, value) in params {
            if let Some(v) = value {
                let _ = write!(url, "{sep}{key}={v}");
                sep = '&';
            }
        }
        url
    }

    /// Parse a path-and-query (or full URL). Unknown parameters are ignored and
    /// unparseable values read as absent.
    pub fn parse(url: &str) -> Self {
        let url = url.split('#').next().unwrap_or_default();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let year = segments
            .windows(2)
            .rev()
            .find(|w| w[0] == YEAR_SEGMENT)
            .and_then(|w| w[1].parse::<i32>().ok());

        let mut route = Route {
            year,
            lat: None,
            lng: None,
            zoom: None,
        };
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.parse::<f64>().ok().filter(|v| v.is_finite());
            match key {
                "lat" => route.lat = value,
                "lng" => route.lng = value,
                "zoom" => route.zoom = value,
                _ => {}
            }
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_expected_url() {
        let route = Route::new(1990, 30.0, -10.0, 1.4);
        assert_eq!(route.to_url(""), "/year/1990?lat=30&lng=-10&zoom=1.4");
        assert_eq!(
            route.to_url("/a/methane-emissions/"),
            "/a/methane-emissions/year/1990?lat=30&lng=-10&zoom=1.4"
        );
    }

    #[test]
    fn url_round_trips_exactly() {
        let cases = [
            (1970, 30.0, -10.0, 1.4),
            (2012, -33.868_820_1, 151.209_296, 5.123_456_789_012_3),
            (1999, 0.1 + 0.2, -179.999_999_999, 22.0),
            (2005, 0.0, 0.0, 0.0),
        ];
        for (year, lat, lng, zoom) in cases {
            for base in ["", "/a/methane-emissions"] {
                let parsed = Route::parse(&Route::new(year, lat, lng, zoom).to_url(base));
                assert_eq!(parsed, Route::new(year, lat, lng, zoom), "base {base:?}");
            }
        }
    }

    #[test]
    fn parses_full_urls_and_ignores_noise() {
        let r = Route::parse("https://example.org/a/methane-emissions/year/1985?zoom=3&foo=bar&lat=12.5&lng=x#top");
        assert_eq!(r.year, Some(1985));
        assert_eq!(r.lat, Some(12.5));
        assert_eq!(r.lng, None);
        assert_eq!(r.zoom, Some(3.0));
        assert_eq!(r.coordinates(), None);
    }

    #[test]
    fn missing_parts_are_none() {
        assert_eq!(
            Route::parse("/"),
            Route { year: None, lat: None, lng: None, zoom: None }
        );
        assert_eq!(Route::parse("/year/abc").year, None);
        assert_eq!(Route::parse("/year").year, None);
        assert_eq!(Route::parse("/?lat=NaN&lng=1&zoom=1").lat, None);
    }

    #[test]
    fn apply_to_keeps_bearing_and_pitch() {
        let view = ViewState { bearing: 15.0, pitch: 30.0, ..ViewState::default() };
        let moved = Route::new(2000, 1.0, 2.0, 3.0).apply_to(view);
        assert_eq!((moved.latitude, moved.longitude, moved.zoom), (1.0, 2.0, 3.0));
        assert_eq!((moved.bearing, moved.pitch), (15.0, 30.0));

        let partial = Route::parse("/year/2000?lat=1&lng=2");
        assert_eq!(partial.apply_to(view), view);
    }

    #[test]
    fn route_without_year_still_renders_query() {
        let r = Route { year: None, lat: Some(1.0), lng: None, zoom: Some(2.0) };
        assert_eq!(r.to_url(""), "/?lat=1&zoom=2");
    }
}
