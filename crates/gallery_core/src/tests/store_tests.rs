use std::sync::Mutex as StdMutex;

use super::*;
use async_trait::async_trait;
use chrono::TimeZone;
use tokio::sync::{Mutex, Notify};

use crate::{
    defaults::DefaultImage,
    notify::{BroadcastNotifier, Severity, TracingNotifier},
    table::{MemoryImageTable, TableResult},
};

struct TestImageTable {
    rows: Vec<ImageRecord>,
    fail_select: Option<TableError>,
    fail_mutations: Option<TableError>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl TestImageTable {
    fn with_rows(rows: Vec<ImageRecord>) -> Self {
        Self {
            rows,
            fail_select: None,
            fail_mutations: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing_select(err: TableError) -> Self {
        let mut table = Self::with_rows(Vec::new());
        table.fail_select = Some(err);
        table
    }

    fn failing_mutations(mut self, err: TableError) -> Self {
        self.fail_mutations = Some(err);
        self
    }

    async fn record_call(&self, call: String) -> TableResult<()> {
        self.calls.lock().await.push(call);
        match &self.fail_mutations {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ImageTable for TestImageTable {
    async fn select_all(&self) -> TableResult<Vec<ImageRecord>> {
        self.calls.lock().await.push("select".into());
        if let Some(err) = &self.fail_select {
            return Err(err.clone());
        }
        Ok(self.rows.clone())
    }

    async fn insert(&self, image: &NewImage) -> TableResult<ImageRecord> {
        self.record_call(format!("insert {}", image.title)).await?;
        Ok(ImageRecord {
            id: ImageId(100),
            src: image.src.clone(),
            title: image.title.clone(),
            description: image.description.clone(),
            created_at: Utc::now(),
        })
    }

    async fn update(&self, id: ImageId, _patch: &ImagePatch) -> TableResult<()> {
        self.record_call(format!("update {id}")).await
    }

    async fn delete(&self, id: ImageId) -> TableResult<()> {
        self.record_call(format!("delete {id}")).await
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: StdMutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notices lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notices lock").push(notice);
    }
}

fn record(id: i64) -> ImageRecord {
    ImageRecord {
        id: ImageId(id),
        src: format!("/uploads/{id}.png"),
        title: format!("Image {id}"),
        description: format!("About {id}"),
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
    }
}

fn ids(images: &[ImageRecord]) -> Vec<i64> {
    images.iter().map(|image| image.id.0).collect()
}

async fn open_store(
    table: TestImageTable,
) -> (GalleryStore, Arc<Mutex<Vec<String>>>, Arc<RecordingNotifier>) {
    let calls = table.calls.clone();
    let notifier = Arc::new(RecordingNotifier::default());
    let store =
        GalleryStore::open(Arc::new(table), notifier.clone(), FallbackImages::clinic()).await;
    (store, calls, notifier)
}

fn rejected(message: &str) -> TableError {
    TableError::Rejected {
        code: Some("42501".into()),
        message: message.into(),
    }
}

#[tokio::test]
async fn empty_table_shows_seven_default_images() {
    let (store, _calls, _notifier) = open_store(TestImageTable::with_rows(Vec::new())).await;

    let state = store.snapshot().await;
    assert!(!state.is_loading());
    assert!(state.error().is_none());
    assert_eq!(ids(state.images()), vec![-1, -2, -3, -4, -5, -6, -7]);
    assert_eq!(
        state.display_order(),
        &(1..=7).map(|n| ImageId(-n)).collect::<Vec<_>>()
    );
    assert_eq!(state.images()[0].title, "Reception Area");
    assert_eq!(state.images()[6].description, "Our expert gynecologist");
}

#[tokio::test]
async fn failed_fetch_shows_defaults_and_keeps_error() {
    let (store, _calls, notifier) =
        open_store(TestImageTable::failing_select(TableError::transport("connection reset"))).await;

    assert!(!store.is_loading().await);
    assert_eq!(store.sorted_images().await.len(), 7);
    assert_eq!(
        store.error().await,
        Some(GalleryError::Fetch(TableError::transport("connection reset")))
    );
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn fetched_rows_keep_fetch_order() {
    let (store, _calls, _notifier) =
        open_store(TestImageTable::with_rows(vec![record(5), record(2)])).await;

    let state = store.snapshot().await;
    assert_eq!(state.display_order(), &[ImageId(5), ImageId(2)]);
    assert_eq!(ids(&store.sorted_images().await), vec![5, 2]);
}

#[tokio::test]
async fn injected_fallback_set_replaces_clinic_defaults() {
    let table = TestImageTable::with_rows(Vec::new());
    let fallback = FallbackImages::new(vec![
        DefaultImage::new("/one.png").titled("One"),
        DefaultImage::new("/two.png"),
    ]);
    let store = GalleryStore::open(Arc::new(table), Arc::new(TracingNotifier), fallback).await;

    let images = store.sorted_images().await;
    assert_eq!(ids(&images), vec![-1, -2]);
    assert_eq!(images[0].title, "One");
    assert_eq!(images[1].title, "Clinic Image 2");
    assert_eq!(images[1].description, "");
}

#[tokio::test]
async fn updating_default_image_is_refused_without_remote_call() {
    let (store, calls, notifier) = open_store(TestImageTable::with_rows(Vec::new())).await;
    let before = store.snapshot().await;

    let err = store
        .update(ImageId(-3), ImagePatch::title("x"))
        .await
        .expect_err("must refuse");
    assert_eq!(
        err,
        GalleryError::DefaultImage {
            op: MutationOp::Update,
            id: ImageId(-3)
        }
    );
    assert_eq!(*calls.lock().await, vec!["select".to_string()]);
    assert_eq!(store.snapshot().await, before);
    assert_eq!(
        notifier.notices(),
        vec![Notice::warning("Cannot update default images")]
    );
}

#[tokio::test]
async fn deleting_default_image_is_refused_without_remote_call() {
    let (store, calls, notifier) = open_store(TestImageTable::with_rows(Vec::new())).await;

    let err = store.delete(ImageId(-1)).await.expect_err("must refuse");
    assert!(matches!(err, GalleryError::DefaultImage { op: MutationOp::Delete, .. }));
    assert_eq!(calls.lock().await.len(), 1);
    assert!(store.snapshot().await.contains(ImageId(-1)));
    assert_eq!(
        notifier.notices(),
        vec![Notice::warning("Cannot delete default images")]
    );
}

#[tokio::test]
async fn delete_removes_image_after_table_accepts() {
    let (store, calls, notifier) =
        open_store(TestImageTable::with_rows(vec![record(5), record(2)])).await;

    store.delete(ImageId(5)).await.expect("delete");

    let state = store.snapshot().await;
    assert!(!state.contains(ImageId(5)));
    assert_eq!(state.display_order(), &[ImageId(2)]);
    assert_eq!(ids(&store.sorted_images().await), vec![2]);
    assert_eq!(calls.lock().await.last().map(String::as_str), Some("delete 5"));
    assert_eq!(
        notifier.notices(),
        vec![Notice::success("Image deleted successfully")]
    );
}

#[tokio::test]
async fn delete_of_unknown_image_skips_table() {
    let (store, calls, notifier) = open_store(TestImageTable::with_rows(vec![record(5)])).await;

    let err = store.delete(ImageId(8)).await.expect_err("must fail");
    assert_eq!(err, GalleryError::NotFound(ImageId(8)));
    assert_eq!(calls.lock().await.len(), 1);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn rejected_delete_leaves_state_and_reports_message() {
    let table = TestImageTable::with_rows(vec![record(5)])
        .failing_mutations(rejected("permission denied"));
    let (store, _calls, notifier) = open_store(table).await;
    let before = store.snapshot().await;

    let err = store.delete(ImageId(5)).await.expect_err("must fail");
    assert!(matches!(err, GalleryError::Mutation { op: MutationOp::Delete, .. }));
    assert_eq!(store.snapshot().await, before);
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Failed to delete image: permission denied")]
    );
}

#[tokio::test]
async fn update_merges_patch_after_table_accepts() {
    let (store, calls, notifier) =
        open_store(TestImageTable::with_rows(vec![record(1), record(2)])).await;

    store
        .update(ImageId(2), ImagePatch::description("Renovated lounge"))
        .await
        .expect("update");

    let state = store.snapshot().await;
    let updated = state.get(ImageId(2)).expect("image 2");
    assert_eq!(updated.title, "Image 2");
    assert_eq!(updated.description, "Renovated lounge");
    assert_eq!(calls.lock().await.last().map(String::as_str), Some("update 2"));
    assert_eq!(
        notifier.notices(),
        vec![Notice::success("Image updated successfully")]
    );
}

#[tokio::test]
async fn rejected_update_leaves_state_unchanged() {
    let table =
        TestImageTable::with_rows(vec![record(1)]).failing_mutations(rejected("row locked"));
    let (store, _calls, notifier) = open_store(table).await;
    let before = store.snapshot().await;

    store
        .update(ImageId(1), ImagePatch::title("Renamed"))
        .await
        .expect_err("must fail");
    assert_eq!(store.snapshot().await, before);
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Failed to update image: row locked")]
    );
}

#[tokio::test]
async fn empty_patch_does_not_reach_table() {
    let (store, calls, notifier) = open_store(TestImageTable::with_rows(vec![record(1)])).await;

    store
        .update(ImageId(1), ImagePatch::default())
        .await
        .expect("no-op update");
    assert_eq!(calls.lock().await.len(), 1);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn every_upload_shows_success_and_storage_advice() {
    let (store, calls, notifier) = open_store(TestImageTable::with_rows(vec![record(1)])).await;
    let file = ImageFile::new("lounge.png", b"png".to_vec());

    let added = store
        .upload(&file, UploadMeta::new("Lounge"))
        .await
        .expect("upload");
    assert_eq!(added.id, ImageId(100));
    assert_eq!(added.src, "data:image/png;base64,cG5n");
    assert_eq!(added.description, "");

    let state = store.snapshot().await;
    assert_eq!(state.display_order(), &[ImageId(1), ImageId(100)]);
    assert_eq!(ids(&store.sorted_images().await), vec![1, 100]);
    assert_eq!(calls.lock().await.last().map(String::as_str), Some("insert Lounge"));

    let notices = notifier.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], Notice::success("Image added successfully"));
    assert_eq!(notices[1].severity, Severity::Info);
    assert_eq!(notices[1].duration, Some(std::time::Duration::from_millis(8000)));

    store
        .upload(&file, UploadMeta::new("Again").with_description("second"))
        .await
        .expect("second upload");
    let notices = notifier.notices();
    assert_eq!(notices.len(), 4);
    assert_eq!(notices[2], Notice::success("Image added successfully"));
    assert_eq!(notices[3], notices[1]);
}

#[tokio::test]
async fn rejected_upload_leaves_state_and_reports_message() {
    let table =
        TestImageTable::with_rows(vec![record(1)]).failing_mutations(rejected("payload too large"));
    let (store, _calls, notifier) = open_store(table).await;
    let before = store.snapshot().await;

    let err = store
        .upload(&ImageFile::new("big.jpg", vec![0; 16]), UploadMeta::new("Big"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, GalleryError::Mutation { op: MutationOp::Insert, .. }));
    assert_eq!(store.snapshot().await, before);
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Failed to save image data: payload too large")]
    );
}

#[tokio::test]
async fn transport_failure_reports_unexpected_error() {
    let table = TestImageTable::with_rows(vec![record(1)])
        .failing_mutations(TableError::transport("timed out"));
    let (store, _calls, notifier) = open_store(table).await;

    store
        .upload(&ImageFile::new("a.png", Vec::new()), UploadMeta::new("A"))
        .await
        .expect_err("must fail");
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("An unexpected error occurred")]
    );
}

#[tokio::test]
async fn reorder_is_local_and_idempotent() {
    let (store, calls, notifier) =
        open_store(TestImageTable::with_rows(vec![record(1), record(2), record(3)])).await;
    let order = vec![ImageId(3), ImageId(1), ImageId(2)];

    store.reorder(order.clone()).await;
    let first = store.sorted_images().await;
    assert_eq!(ids(&first), vec![3, 1, 2]);

    store.reorder(order).await;
    assert_eq!(store.sorted_images().await, first);
    assert_eq!(calls.lock().await.len(), 1);
    assert_eq!(
        notifier.notices(),
        vec![Notice::success("Images reordered"); 2]
    );
}

#[tokio::test]
async fn uploaded_images_survive_a_fresh_store_over_the_same_table() {
    let table = Arc::new(MemoryImageTable::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let store = GalleryStore::open(table.clone(), notifier.clone(), FallbackImages::clinic()).await;
    assert_eq!(store.sorted_images().await.len(), 7);
    let added = store
        .upload(&ImageFile::new("a.png", b"a".to_vec()), UploadMeta::new("First"))
        .await
        .expect("upload");
    assert_eq!(added.id, ImageId(1));
    store.reorder(vec![ImageId(1), ImageId(-1)]).await;

    let rows = table.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].src, "data:image/png;base64,YQ==");

    let reopened = GalleryStore::open(table, notifier, FallbackImages::clinic()).await;
    let images = reopened.sorted_images().await;
    assert_eq!(ids(&images), vec![1]);
    assert_eq!(images[0].title, "First");
}

#[tokio::test]
async fn broadcast_subscribers_receive_store_notices() {
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut events = notifier.subscribe();
    let store = GalleryStore::open(
        Arc::new(TestImageTable::with_rows(vec![record(1)])),
        notifier.clone(),
        FallbackImages::clinic(),
    )
    .await;

    store.delete(ImageId(1)).await.expect("delete");
    store.delete(ImageId(-2)).await.expect_err("default image");

    assert_eq!(
        events.recv().await.expect("first notice"),
        Notice::success("Image deleted successfully")
    );
    assert_eq!(
        events.recv().await.expect("second notice"),
        Notice::warning("Cannot delete default images")
    );
}

#[tokio::test]
async fn broadcast_without_subscribers_drops_notices() {
    let notifier = BroadcastNotifier::new(4);
    notifier.notify(Notice::info("nobody listening"));

    let mut late = notifier.subscribe();
    notifier.notify(Notice::info("heard"));
    assert_eq!(late.recv().await.expect("notice"), Notice::info("heard"));
}

struct GatedImageTable {
    started: Arc<Notify>,
    release: Arc<Notify>,
    rows: Vec<ImageRecord>,
}

#[async_trait]
impl ImageTable for GatedImageTable {
    async fn select_all(&self) -> TableResult<Vec<ImageRecord>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.rows.clone())
    }

    async fn insert(&self, _image: &NewImage) -> TableResult<ImageRecord> {
        Err(TableError::EmptyResponse)
    }

    async fn update(&self, _id: ImageId, _patch: &ImagePatch) -> TableResult<()> {
        Ok(())
    }

    async fn delete(&self, _id: ImageId) -> TableResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn store_reports_loading_while_fetch_is_pending() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let table = GatedImageTable {
        started: started.clone(),
        release: release.clone(),
        rows: vec![record(4)],
    };
    let store = Arc::new(GalleryStore::new(
        Arc::new(table),
        Arc::new(TracingNotifier),
        FallbackImages::clinic(),
    ));

    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all().await }
    });
    started.notified().await;

    let pending = store.snapshot().await;
    assert!(pending.is_loading());
    assert!(pending.images().is_empty());

    release.notify_one();
    fetch.await.expect("fetch task");

    assert!(!store.is_loading().await);
    assert_eq!(ids(&store.sorted_images().await), vec![4]);
}

#[tokio::test]
async fn empty_insert_representation_reports_unexpected_error() {
    let notifier = Arc::new(RecordingNotifier::default());
    let table = GatedImageTable {
        started: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
        rows: Vec::new(),
    };
    let store = GalleryStore::new(Arc::new(table), notifier.clone(), FallbackImages::clinic());

    let err = store
        .upload(&ImageFile::new("a.png", b"a".to_vec()), UploadMeta::new("A"))
        .await
        .expect_err("must fail");
    assert_eq!(err, GalleryError::mutation(MutationOp::Insert, TableError::EmptyResponse));
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("An unexpected error occurred")]
    );
}
