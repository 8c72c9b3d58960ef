use serde::Deserialize;

use animedex_core::models::{AiredRange, CatalogItem, Trailer};

// ── Envelopes ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JikanListResponse {
    pub data: Vec<JikanAnime>,
}

#[derive(Debug, Deserialize)]
pub struct JikanSingleResponse {
    pub data: JikanAnime,
}

/// Body of a non-2xx answer.
#[derive(Debug, Default, Deserialize)]
pub struct JikanErrorBody {
    pub message: Option<String>,
}

// ── Anime resource ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JikanAnime {
    pub mal_id: u64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub images: JikanImages,
    pub synopsis: Option<String>,
    pub score: Option<f32>,
    pub episodes: Option<u32>,
    pub genres: Option<Vec<JikanNamedResource>>,
    pub status: Option<String>,
    pub aired: Option<JikanAired>,
    pub duration: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub popularity: Option<u32>,
    pub members: Option<u64>,
    pub trailer: Option<JikanTrailer>,
}

#[derive(Debug, Deserialize)]
pub struct JikanImages {
    pub jpg: JikanImageSet,
}

#[derive(Debug, Deserialize)]
pub struct JikanImageSet {
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JikanNamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JikanAired {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JikanTrailer {
    pub url: Option<String>,
    pub embed_url: Option<String>,
}

// ── Conversion to the domain model ──────────────────────────────

impl JikanAnime {
    /// Reshape into a [`CatalogItem`]. Absent optional fields stay absent.
    pub fn into_catalog_item(self) -> CatalogItem {
        CatalogItem {
            id: self.mal_id,
            title: self.title,
            title_english: self.title_english,
            title_japanese: self.title_japanese,
            image: self.images.jpg.image_url.unwrap_or_default(),
            description: self.synopsis.unwrap_or_default(),
            rating: self.score,
            episodes: self.episodes,
            genres: self
                .genres
                .map(|g| g.into_iter().map(|x| x.name).collect()),
            status: self.status,
            aired: self.aired.and_then(|a| {
                a.from.map(|from| AiredRange { from, to: a.to })
            }),
            duration: self.duration,
            source: self.source,
            media_type: self.media_type,
            popularity: self.popularity,
            members: self.members,
            trailer: self.trailer.and_then(|t| match (t.url, t.embed_url) {
                (Some(url), Some(embed_url)) => Some(Trailer { url, embed_url }),
                _ => None,
            }),
        }
    }
}
