use serde::{Deserialize, Serialize};

const SAMPLE_POSTS: &str = include_str!("../resources/gallery.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPost {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub username: String,
    pub user_avatar: String,
    pub likes: u32,
    pub comments: u32,
    pub manga_title: String,
    pub character: String,
    /// Unix seconds; the recency sort key.
    pub posted_at: i64,
}

impl GalleryPost {
    fn matches_search(&self, needle: &str) -> bool {
        [&self.title, &self.username, &self.manga_title, &self.character]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most liked first.
    #[default]
    Popular,
    /// Newest first.
    Recent,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    pub search: Option<String>,
    /// Only posts from this manga; `None` means all.
    pub manga: Option<String>,
    pub sort: SortOrder,
}

/// The community hub's posts, filtered and sorted on demand.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    posts: Vec<GalleryPost>,
}

impl Gallery {
    pub fn new(posts: Vec<GalleryPost>) -> Self {
        Self { posts }
    }

    /// The bundled demo posts.
    pub fn sample() -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(SAMPLE_POSTS)?))
    }

    pub fn posts(&self) -> &[GalleryPost] {
        &self.posts
    }

    /// Distinct manga titles in the order they first appear.
    pub fn manga_titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = Vec::new();
        for post in &self.posts {
            if !titles.contains(&post.manga_title.as_str()) {
                titles.push(&post.manga_title);
            }
        }
        titles
    }

    /// The search is a plain lowercase substring match, so whitespace counts
    /// and an empty search matches everything.
    pub fn filter(&self, query: &GalleryQuery) -> Vec<&GalleryPost> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut posts: Vec<&GalleryPost> = self
            .posts
            .iter()
            .filter(|post| needle.as_deref().is_none_or(|n| post.matches_search(n)))
            .filter(|post| {
                query
                    .manga
                    .as_deref()
                    .is_none_or(|manga| post.manga_title == manga)
            })
            .collect();

        match query.sort {
            SortOrder::Popular => posts.sort_by(|a, b| b.likes.cmp(&a.likes)),
            SortOrder::Recent => posts.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
        }
        posts
    }

    /// The post to feature above a result list: the most liked one. On a
    /// tie in recent order the later post in the list wins.
    pub fn featured<'a>(results: &[&'a GalleryPost], sort: SortOrder) -> Option<&'a GalleryPost> {
        match sort {
            SortOrder::Popular => results.first().copied(),
            SortOrder::Recent => results
                .iter()
                .copied()
                .reduce(|max, post| if max.likes > post.likes { max } else { post }),
        }
    }
}
