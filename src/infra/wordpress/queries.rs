//! GraphQL documents sent to the WordPress backend.

use crate::domain::content::ContentKind;

const POST_FIELDS: &str = r#"
    slug
    title
    content
    excerpt
    date
    author { node { name } }
    featuredImage { node { sourceUrl } }
    seo { title metaDesc }
    blocks { name attributesJSON }
    cacheSettings { revalidate }
"#;

const SUMMARY_FIELDS: &str = "slug title excerpt date";

pub(super) fn by_slug(kind: ContentKind) -> String {
    match kind {
        ContentKind::Post => format!(
            "query PostBySlug($id: ID!, $asPreview: Boolean) {{ \
               node: post(id: $id, idType: SLUG, asPreview: $asPreview) {{ {POST_FIELDS} }} }}"
        ),
        ContentKind::Page => format!(
            "query PageByUri($id: ID!, $asPreview: Boolean) {{ \
               node: page(id: $id, idType: URI, asPreview: $asPreview) {{ {POST_FIELDS} }} }}"
        ),
        ContentKind::Category => format!(
            "query CategoryBySlug($id: ID!) {{ \
               node: category(id: $id, idType: SLUG) {{ \
                 slug title: name content: description \
                 seo {{ title metaDesc }} \
                 cacheSettings {{ revalidate }} \
                 posts(first: 50) {{ nodes {{ {SUMMARY_FIELDS} }} }} }} }}"
        ),
        ContentKind::Author => format!(
            "query AuthorBySlug($id: ID!) {{ \
               node: user(id: $id, idType: SLUG) {{ \
                 slug title: name content: description \
                 seo {{ title metaDesc }} \
                 posts(first: 50) {{ nodes {{ {SUMMARY_FIELDS} }} }} }} }}"
        ),
    }
}

pub(super) fn post_page() -> String {
    format!(
        "query PostPage($offset: Int!, $size: Int!) {{ \
           nodes: posts(where: {{ offsetPagination: {{ offset: $offset, size: $size }}, \
                                  orderby: {{ field: DATE, order: DESC }} }}) {{ \
             nodes {{ {POST_FIELDS} }} }} }}"
    )
}

pub(super) fn count(kind: ContentKind) -> String {
    let connection = match kind {
        ContentKind::Post => "posts",
        ContentKind::Page => "pages",
        ContentKind::Category => "categories",
        ContentKind::Author => "users",
    };
    format!(
        "query Count {{ \
           connection: {connection}(where: {{ offsetPagination: {{ size: 1 }} }}) {{ \
             pageInfo {{ offsetPagination {{ total }} }} }} }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_looked_up_by_uri() {
        assert!(by_slug(ContentKind::Page).contains("idType: URI"));
        assert!(by_slug(ContentKind::Post).contains("idType: SLUG"));
    }

    #[test]
    fn count_targets_the_kind_connection() {
        assert!(count(ContentKind::Author).contains("connection: users("));
        assert!(count(ContentKind::Post).contains("connection: posts("));
    }
}
