/// Story lifecycle and listing queries
///
/// Owner-only mutations (edit, delete, toggle visibility) and comment
/// deletion follow load-mutate-save against the story store. Listings are
/// PUBLIC-only unless the method says otherwise and are newest first.
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::clients::MediaUploader;
use crate::db::{Page, PageRequest, StoryQuery, StoryStore};
use crate::error::{AppError, Result};
use crate::models::{CategoryFilter, Comment, Story, StoryDraft, StoryEdit, Visibility};

/// One image attached to a new story.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct StoryService {
    stories: Arc<dyn StoryStore>,
    uploader: Arc<dyn MediaUploader>,
    list_batch_size: u32,
}

impl StoryService {
    pub fn new(
        stories: Arc<dyn StoryStore>,
        uploader: Arc<dyn MediaUploader>,
        list_batch_size: u32,
    ) -> Self {
        Self {
            stories,
            uploader,
            list_batch_size: list_batch_size.max(1),
        }
    }

    /// Create a story, uploading its images first. Any upload failure aborts
    /// creation and nothing is saved.
    pub async fn create(
        &self,
        author_id: &str,
        draft: StoryDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Story> {
        let mut image_urls = Vec::with_capacity(images.len());
        for image in images {
            if image.bytes.is_empty() {
                continue;
            }
            let url = self.uploader.upload(&image.file_name, image.bytes).await?;
            image_urls.push(url);
        }

        let story = Story::new(author_id, draft, image_urls, Utc::now());
        let saved = self.stories.save(&story).await?;

        info!(
            story_id = %saved.id,
            user_id = author_id,
            category = saved.category.as_str(),
            visibility = saved.visibility.as_str(),
            images = saved.image_urls.len(),
            "Story created"
        );
        Ok(saved)
    }

    async fn load(&self, story_id: Uuid) -> Result<Story> {
        self.stories
            .get(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))
    }

    async fn load_owned(&self, story_id: Uuid, actor: &str) -> Result<Story> {
        let story = self.load(story_id).await?;
        if !story.is_owned_by(actor) {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(story)
    }

    /// PUBLIC stories are readable by anyone; PRIVATE ones only by the owner.
    pub async fn get(&self, story_id: Uuid, viewer: Option<&str>) -> Result<Story> {
        let story = self.load(story_id).await?;
        ensure_readable(&story, viewer)?;
        Ok(story)
    }

    pub async fn edit(&self, story_id: Uuid, actor: &str, edit: StoryEdit) -> Result<Story> {
        let mut story = self.load_owned(story_id, actor).await?;
        story.apply_edit(edit, Utc::now())?;
        let saved = self.stories.save(&story).await?;

        info!(story_id = %story_id, user_id = actor, "Story edited");
        Ok(saved)
    }

    pub async fn delete(&self, story_id: Uuid, actor: &str) -> Result<()> {
        self.load_owned(story_id, actor).await?;
        if !self.stories.delete(story_id).await? {
            return Err(AppError::NotFound("Story not found".into()));
        }

        info!(story_id = %story_id, user_id = actor, "Story deleted");
        Ok(())
    }

    pub async fn toggle_visibility(&self, story_id: Uuid, actor: &str) -> Result<Story> {
        let mut story = self.load_owned(story_id, actor).await?;
        story.visibility = story.visibility.toggled();
        story.updated_at = Utc::now();
        let saved = self.stories.save(&story).await?;

        info!(
            story_id = %story_id,
            visibility = saved.visibility.as_str(),
            "Story visibility toggled"
        );
        Ok(saved)
    }

    /// Allowed for the comment author and the story owner.
    pub async fn delete_comment(
        &self,
        story_id: Uuid,
        comment_id: Uuid,
        actor: &str,
    ) -> Result<Story> {
        let mut story = self.load(story_id).await?;
        story.remove_comment(comment_id, actor, Utc::now())?;
        let saved = self.stories.save(&story).await?;

        info!(story_id = %story_id, comment_id = %comment_id, user_id = actor, "Comment deleted");
        Ok(saved)
    }

    /// Every matching story, newest first, read from the store in batches.
    async fn list(&self, query: StoryQuery) -> Result<Vec<Story>> {
        let mut stories = Vec::new();
        let mut request = PageRequest::first(self.list_batch_size);

        loop {
            let batch = self.stories.find(&query, request).await?;
            let done = batch.last || batch.content.is_empty();
            stories.extend(batch.content);
            if done {
                return Ok(stories);
            }
            request.page += 1;
        }
    }

    pub async fn all_public(&self) -> Result<Vec<Story>> {
        self.list(StoryQuery::public()).await
    }

    pub async fn public_page(&self, page: PageRequest) -> Result<Page<Story>> {
        self.stories.find(&StoryQuery::public(), page).await
    }

    /// The author's PUBLIC stories, leaving out the ones posted anonymously.
    pub async fn by_author(&self, author_id: &str) -> Result<Vec<Story>> {
        self.list(StoryQuery::public().author(author_id).attributed())
            .await
    }

    /// Tags match case-insensitively; a leading `#` is ignored.
    pub async fn by_hashtag(&self, tag: &str) -> Result<Vec<Story>> {
        if tag.trim().trim_start_matches('#').is_empty() {
            return Ok(Vec::new());
        }
        self.list(StoryQuery::public().hashtag(tag)).await
    }

    /// `None`, blank or `ALL` list every category.
    pub async fn by_category(&self, category: Option<&str>) -> Result<Vec<Story>> {
        let filter = CategoryFilter::parse(category)?;
        self.list(StoryQuery::public().category(filter.category()))
            .await
    }

    /// Case-insensitive substring search over title and content. A blank
    /// query yields an empty page.
    pub async fn search(&self, text: &str, page: PageRequest) -> Result<Page<Story>> {
        if text.trim().is_empty() {
            return Ok(Page::empty(page));
        }
        self.stories
            .find(&StoryQuery::public().text(text), page)
            .await
    }

    pub async fn my_private(&self, owner: &str) -> Result<Vec<Story>> {
        self.list(StoryQuery::with_visibility(Visibility::Private).author(owner))
            .await
    }

    pub async fn my_public(&self, owner: &str) -> Result<Vec<Story>> {
        self.list(StoryQuery::public().author(owner)).await
    }

    /// Comments newest first, returned with the story they belong to (its
    /// comment list emptied). Readability follows the story's visibility.
    pub async fn comments_page(
        &self,
        story_id: Uuid,
        viewer: Option<&str>,
        page: PageRequest,
    ) -> Result<(Story, Page<Comment>)> {
        let mut story = self.get(story_id, viewer).await?;

        let mut comments = std::mem::take(&mut story.comments);
        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok((story, Page::from_sorted(comments, page)))
    }
}

fn ensure_readable(story: &Story, viewer: Option<&str>) -> Result<()> {
    if story.is_visible_to(viewer) {
        return Ok(());
    }
    match viewer {
        None => Err(AppError::Unauthorized(
            "sign in to view this story".into(),
        )),
        Some(_) => Err(AppError::Forbidden("Access denied".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::media::MockMediaUploader;
    use crate::db::InMemoryStoryStore;
    use crate::models::StoryCategory;
    use chrono::Duration;

    fn service(store: Arc<InMemoryStoryStore>) -> StoryService {
        let mut uploader = MockMediaUploader::new();
        uploader.expect_upload().never();
        StoryService::new(store, Arc::new(uploader), 100)
    }

    fn draft(content: &str) -> StoryDraft {
        StoryDraft {
            title: "A title".into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_uploads_images_in_order() {
        let store = Arc::new(InMemoryStoryStore::new());
        let mut uploader = MockMediaUploader::new();
        uploader
            .expect_upload()
            .times(2)
            .returning(|name, _| Ok(format!("https://cdn/{name}")));
        let service = StoryService::new(store.clone(), Arc::new(uploader), 100);

        let story = service
            .create(
                "alice",
                draft("#first post"),
                vec![
                    ImageUpload {
                        file_name: "a.png".into(),
                        bytes: vec![1, 2, 3],
                    },
                    ImageUpload {
                        file_name: "b.png".into(),
                        bytes: vec![4],
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(story.image_urls, vec!["https://cdn/a.png", "https://cdn/b.png"]);
        assert_eq!(story.hashtags, vec!["first"]);
        assert_eq!(story.visibility, Visibility::Public);
        assert_eq!(story.category, StoryCategory::General);
        assert!(store.get(story.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upload_failure_saves_nothing() {
        let store = Arc::new(InMemoryStoryStore::new());
        let mut uploader = MockMediaUploader::new();
        uploader
            .expect_upload()
            .returning(|_, _| Err(AppError::Upstream("cdn down".into())));
        let service = StoryService::new(store.clone(), Arc::new(uploader), 100);

        let err = service
            .create(
                "alice",
                draft("x"),
                vec![ImageUpload {
                    file_name: "a.png".into(),
                    bytes: vec![1],
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_private_story_access() {
        let store = Arc::new(InMemoryStoryStore::new());
        let service = service(store);
        let story = service
            .create(
                "alice",
                StoryDraft {
                    visibility: Some(Visibility::Private),
                    ..draft("secret")
                },
                Vec::new(),
            )
            .await
            .unwrap();

        assert!(matches!(
            service.get(story.id, None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.get(story.id, Some("bob")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(service.get(story.id, Some("alice")).await.is_ok());
        assert!(matches!(
            service.get(Uuid::new_v4(), Some("alice")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_only_mutations() {
        let store = Arc::new(InMemoryStoryStore::new());
        let service = service(store);
        let story = service.create("alice", draft("#a"), Vec::new()).await.unwrap();

        let err = service
            .edit(story.id, "bob", StoryEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(matches!(
            service.toggle_visibility(story.id, "bob").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(story.id, "bob").await,
            Err(AppError::Forbidden(_))
        ));

        let edited = service
            .edit(
                story.id,
                "alice",
                StoryEdit {
                    content: Some("now #b".into()),
                    visibility: Some("private".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.hashtags, vec!["b"]);
        assert_eq!(edited.visibility, Visibility::Private);
        assert!(edited.updated_at >= story.updated_at);

        let toggled = service.toggle_visibility(story.id, "alice").await.unwrap();
        assert_eq!(toggled.visibility, Visibility::Public);

        service.delete(story.id, "alice").await.unwrap();
        assert!(matches!(
            service.get(story.id, Some("alice")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let store = Arc::new(InMemoryStoryStore::new());
        let service = service(store);

        let love = service
            .create(
                "alice",
                StoryDraft {
                    category: Some(StoryCategory::Love),
                    ..draft("Rain on the #Window")
                },
                Vec::new(),
            )
            .await
            .unwrap();
        let private = service
            .create(
                "alice",
                StoryDraft {
                    visibility: Some(Visibility::Private),
                    ..draft("rain again #window")
                },
                Vec::new(),
            )
            .await
            .unwrap();
        service.create("bob", draft("sunny"), Vec::new()).await.unwrap();

        assert_eq!(service.all_public().await.unwrap().len(), 2);
        assert_eq!(service.by_author("alice").await.unwrap().len(), 1);
        assert_eq!(service.by_hashtag("#WINDOW").await.unwrap()[0].id, love.id);
        assert!(service.by_hashtag("#").await.unwrap().is_empty());
        assert_eq!(service.by_category(Some("LOVE")).await.unwrap().len(), 1);
        assert_eq!(service.by_category(Some("ALL")).await.unwrap().len(), 2);
        assert!(matches!(
            service.by_category(Some("SPORTS")).await,
            Err(AppError::InvalidArgument(_))
        ));

        let found = service.search("RAIN", PageRequest::new(0, 10)).await.unwrap();
        assert_eq!(found.total_elements, 1);
        assert_eq!(found.content[0].id, love.id);
        assert_eq!(
            service
                .search("   ", PageRequest::new(0, 10))
                .await
                .unwrap()
                .total_elements,
            0
        );

        let mine = service.my_private("alice").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, private.id);
        assert_eq!(service.my_public("alice").await.unwrap()[0].id, love.id);
    }

    #[tokio::test]
    async fn test_author_listing_hides_anonymous_stories() {
        let store = Arc::new(InMemoryStoryStore::new());
        let service = service(store);

        let signed = service.create("alice", draft("signed"), Vec::new()).await.unwrap();
        let hidden = service
            .create(
                "alice",
                StoryDraft {
                    anonymous: Some(true),
                    ..draft("unsigned")
                },
                Vec::new(),
            )
            .await
            .unwrap();

        let by_author = service.by_author("alice").await.unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].id, signed.id);

        // the author still sees their own anonymous stories
        let mine: Vec<Uuid> = service
            .my_public("alice")
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert!(mine.contains(&hidden.id));
        assert!(mine.contains(&signed.id));
    }

    #[tokio::test]
    async fn test_unpaged_listings_return_every_story() {
        let store = Arc::new(InMemoryStoryStore::new());
        let mut uploader = MockMediaUploader::new();
        uploader.expect_upload().never();
        let service = StoryService::new(store, Arc::new(uploader), 20);

        for i in 0..130 {
            service
                .create("alice", draft(&format!("story {i} #many")), Vec::new())
                .await
                .unwrap();
        }

        assert_eq!(service.all_public().await.unwrap().len(), 130);
        assert_eq!(service.by_author("alice").await.unwrap().len(), 130);
        assert_eq!(service.my_public("alice").await.unwrap().len(), 130);
        assert_eq!(service.by_hashtag("many").await.unwrap().len(), 130);
        assert_eq!(service.by_category(None).await.unwrap().len(), 130);

        let all = service.all_public().await.unwrap();
        assert!(all
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_comments_page_newest_first() {
        let store = Arc::new(InMemoryStoryStore::new());
        let mut story = Story::new("alice", draft("x"), Vec::new(), Utc::now());
        let base = Utc::now();
        for i in 0..7 {
            story.add_comment("bob", &format!("c{i}"), base + Duration::seconds(i));
        }
        store.save(&story).await.unwrap();
        let service = service(store);

        let (_, first) = service
            .comments_page(story.id, None, PageRequest::new(0, 5))
            .await
            .unwrap();
        let texts: Vec<_> = first.content.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["c6", "c5", "c4", "c3", "c2"]);
        assert_eq!(first.total_elements, 7);
        assert_eq!(first.total_pages, 2);

        let (parent, second) = service
            .comments_page(story.id, None, PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(second.content.len(), 2);
        assert!(second.last);
        assert_eq!(parent.id, story.id);
    }

    #[tokio::test]
    async fn test_delete_comment_by_story_owner() {
        let store = Arc::new(InMemoryStoryStore::new());
        let mut story = Story::new("alice", draft("x"), Vec::new(), Utc::now());
        let comment_id = story.add_comment("bob", "hi", Utc::now()).id;
        store.save(&story).await.unwrap();
        let service = service(store.clone());

        assert!(matches!(
            service.delete_comment(story.id, comment_id, "mallory").await,
            Err(AppError::Forbidden(_))
        ));
        let updated = service
            .delete_comment(story.id, comment_id, "alice")
            .await
            .unwrap();
        assert_eq!(updated.comment_count(), 0);
        assert_eq!(store.get(story.id).await.unwrap().unwrap().comment_count(), 0);
    }
}
