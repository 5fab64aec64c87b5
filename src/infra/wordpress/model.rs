//! WPGraphQL response shapes and their mapping onto [`ContentRecord`].

use serde::Deserialize;
use serde_json::Value;

use crate::domain::content::{ContentBlock, ContentKind, ContentRecord, PostSummary, Revalidate};

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct NodeData {
    pub node: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PageData {
    pub nodes: Option<Nodes<RawNode>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CountData {
    pub connection: Option<CountConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CountConnection {
    page_info: CountPageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountPageInfo {
    offset_pagination: OffsetTotal,
}

#[derive(Debug, Deserialize)]
struct OffsetTotal {
    #[serde(default)]
    total: u64,
}

impl CountConnection {
    pub fn total(&self) -> u64 {
        self.page_info.offset_pagination.total
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeo {
    title: Option<String>,
    meta_desc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    name: String,
    #[serde(rename = "attributesJSON", default)]
    attributes_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCacheSettings {
    revalidate: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    slug: String,
    title: Option<String>,
    excerpt: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawNode {
    slug: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    author: Option<Edge<RawAuthor>>,
    #[serde(default)]
    featured_image: Option<Edge<RawImage>>,
    #[serde(default)]
    seo: Option<RawSeo>,
    #[serde(default)]
    blocks: Option<Vec<RawBlock>>,
    #[serde(default)]
    cache_settings: Option<RawCacheSettings>,
    #[serde(default)]
    posts: Option<Nodes<RawSummary>>,
}

impl RawNode {
    pub fn into_record(self, kind: ContentKind, fallback_revalidate_secs: u64) -> ContentRecord {
        let revalidate = Revalidate::from_setting(
            self.cache_settings
                .as_ref()
                .and_then(|settings| settings.revalidate.as_ref()),
            fallback_revalidate_secs,
        );
        let (seo_title, seo_description) = match self.seo {
            Some(seo) => (seo.title, seo.meta_desc),
            None => (None, None),
        };

        ContentRecord {
            kind,
            title: self.title.unwrap_or_else(|| self.slug.clone()),
            slug: self.slug,
            body_html: self.content.unwrap_or_default(),
            excerpt: self.excerpt.filter(|s| !s.trim().is_empty()),
            published_at: self.date,
            author: self.author.and_then(|edge| edge.node).and_then(|a| a.name),
            featured_image: self
                .featured_image
                .and_then(|edge| edge.node)
                .and_then(|image| image.source_url),
            seo_title,
            seo_description,
            blocks: self
                .blocks
                .unwrap_or_default()
                .into_iter()
                .map(|block| ContentBlock {
                    attributes: block
                        .attributes_json
                        .as_deref()
                        .and_then(|raw| serde_json::from_str(raw).ok())
                        .unwrap_or(Value::Null),
                    name: block.name,
                })
                .collect(),
            posts: self
                .posts
                .map(|posts| posts.nodes)
                .unwrap_or_default()
                .into_iter()
                .map(|summary| PostSummary {
                    title: summary.title.unwrap_or_else(|| summary.slug.clone()),
                    slug: summary.slug,
                    excerpt: summary.excerpt.unwrap_or_default(),
                    published_at: summary.date,
                })
                .collect(),
            revalidate,
        }
    }
}
