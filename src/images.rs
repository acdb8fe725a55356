//! Image CDN URLs: `{base}/{size}{path}`, with local placeholders when the
//! backend has no path for an image.

pub const POSTER_PLACEHOLDER: &str = "/vibrant-cityscape-night.png";
pub const BACKDROP_PLACEHOLDER: &str = "/vibrant-cityscape.png";
pub const STILL_PLACEHOLDER: &str = "/bustling-city-street.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W92,
    W300,
    W342,
    W500,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W92 => "w92",
            ImageSize::W300 => "w300",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn poster(&self, path: Option<&str>, size: ImageSize) -> String {
        self.resolve(path, size, POSTER_PLACEHOLDER)
    }

    pub fn backdrop(&self, path: Option<&str>, size: ImageSize) -> String {
        self.resolve(path, size, BACKDROP_PLACEHOLDER)
    }

    pub fn still(&self, path: Option<&str>, size: ImageSize) -> String {
        self.resolve(path, size, STILL_PLACEHOLDER)
    }

    fn resolve(&self, path: Option<&str>, size: ImageSize, placeholder: &str) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(p) => format!("{}/{}{}", self.base, size.as_str(), p),
            None => placeholder.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_size_and_path() {
        let images = ImageUrls::new("https://image.tmdb.org/t/p/");
        assert_eq!(
            images.poster(Some("/abc.jpg"), ImageSize::W342),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
        assert_eq!(
            images.backdrop(Some("/bd.jpg"), ImageSize::Original),
            "https://image.tmdb.org/t/p/original/bd.jpg"
        );
    }

    #[test]
    fn missing_paths_use_placeholders() {
        let images = ImageUrls::new("https://cdn.example");
        assert_eq!(images.poster(None, ImageSize::W500), POSTER_PLACEHOLDER);
        assert_eq!(images.backdrop(Some(""), ImageSize::Original), BACKDROP_PLACEHOLDER);
        assert_eq!(images.still(None, ImageSize::W300), STILL_PLACEHOLDER);
    }
}
