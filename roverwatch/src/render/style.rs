//! Base map style descriptors and attribution aggregation.

use serde::Serialize;

use crate::view::StyleKey;

const CARTO_ATTRIBUTION: &str = "© OpenStreetMap contributors © CARTO";
const ESRI_ATTRIBUTION: &str =
    "Tiles © Esri — Source: Esri, Maxar, Earthstar Geographics, and the GIS User Community";

/// Kind of base map source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseSourceKind {
    Raster,
    Vector,
}

/// A source declared by a base style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseSource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BaseSourceKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tiles: Vec<String>,
    #[serde(rename = "tileSize")]
    pub tile_size: u32,
    #[serde(rename = "maxzoom")]
    pub max_zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// A base map style.
///
/// `url` points at a remote style document when there is one; `sources`
/// lists what the style provides, which is what attribution is read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub sources: Vec<BaseSource>,
}

impl StyleDescriptor {
    /// The built-in style for a key.
    pub fn for_key(key: StyleKey) -> Self {
        match key {
            StyleKey::Dark => carto_style(
                "dark",
                "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json",
            ),
            StyleKey::Street => carto_style(
                "street",
                "https://basemaps.cartocdn.com/gl/voyager-gl-style/style.json",
            ),
            StyleKey::Satellite => Self {
                name: "satellite".to_string(),
                url: None,
                sources: vec![BaseSource {
                    id: "maxar-imagery".to_string(),
                    kind: BaseSourceKind::Raster,
                    tiles: vec![
                        "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
                            .to_string(),
                    ],
                    tile_size: 256,
                    max_zoom: 19,
                    attribution: Some(ESRI_ATTRIBUTION.to_string()),
                }],
            },
        }
    }
}

fn carto_style(name: &str, url: &str) -> StyleDescriptor {
    StyleDescriptor {
        name: name.to_string(),
        url: Some(url.to_string()),
        sources: vec![BaseSource {
            id: "carto".to_string(),
            kind: BaseSourceKind::Vector,
            tiles: Vec::new(),
            tile_size: 512,
            max_zoom: 14,
            attribution: Some(CARTO_ATTRIBUTION.to_string()),
        }],
    }
}

/// Join attribution strings, dropping blanks and repeats while keeping
/// first-seen order.
pub fn aggregate_attribution<I, S>(attributions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for a in attributions {
        let a = a.as_ref().trim();
        if !a.is_empty() && !seen.iter().any(|s| s == a) {
            seen.push(a.to_string());
        }
    }
    seen.join(" | ")
}
