use lodestore_outbox::{MutationEvent, MutationOutbox};
use lodestore_predicate::{Operator, PredicateBuilder};
use lodestore_schema::{ModelField, SchemaModel};
use lodestore_types::{OpType, Record};
use pretty_assertions::assert_eq;
use serde_json::json;

fn data(title: &str) -> Record {
    Record::from_value(json!({ "id": "1", "title": title })).unwrap()
}

fn condition() -> lodestore_predicate::ModelPredicate {
    let model = SchemaModel::new("Post", vec![ModelField::id("id"), ModelField::string("title")]);
    PredicateBuilder::new(&model)
        .field("title", Operator::Eq, "expected")
        .unwrap()
        .build()
}

// ── Coalescing ───────────────────────────────────────────────────

#[tokio::test]
async fn create_update_delete_collapses_to_nothing() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::create("Post", "1", data("a"))).await;
    outbox.enqueue(MutationEvent::update("Post", "1", data("b"))).await;
    outbox.enqueue(MutationEvent::delete("Post", "1", data("b"))).await;

    assert!(outbox.get_for_model("1").await.is_empty());
    assert!(outbox.is_empty().await);
}

#[tokio::test]
async fn update_merges_into_unsent_create() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::create("Post", "1", data("a"))).await;
    outbox
        .enqueue(MutationEvent::update("Post", "1", data("b")).with_condition(condition()))
        .await;

    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].operation, OpType::Create);
    assert_eq!(pending[0].data, data("b"));
    // An unsent create cannot be conditioned.
    assert!(pending[0].condition.is_none());
}

#[tokio::test]
async fn second_unconditioned_update_supersedes_first() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("first"))).await;
    outbox.enqueue(MutationEvent::update("Post", "1", data("second"))).await;

    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].data, data("second"));
}

#[tokio::test]
async fn conditioned_update_queues_behind_pending_update() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("first"))).await;
    outbox
        .enqueue(MutationEvent::update("Post", "1", data("second")).with_condition(condition()))
        .await;

    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].data, data("first"));
    assert!(pending[1].condition.is_some());
}

#[tokio::test]
async fn different_records_never_coalesce() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("a"))).await;
    outbox.enqueue(MutationEvent::update("Post", "2", data("b"))).await;
    assert_eq!(outbox.len().await, 2);
    assert_eq!(
        outbox.model_ids().await,
        ["1", "2"].iter().map(|s| s.to_string()).collect()
    );
}

// ── Claim & dequeue ──────────────────────────────────────────────

#[tokio::test]
async fn peek_claims_head_and_is_idempotent() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("a"))).await;
    outbox.enqueue(MutationEvent::update("Post", "2", data("b"))).await;

    let first = outbox.peek().await.unwrap();
    let again = outbox.peek().await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.model_id, "1");
}

#[tokio::test]
async fn claimed_event_is_not_coalesced_against() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("in flight"))).await;
    let claimed = outbox.peek().await.unwrap();

    // While the head is claimed, a new unconditioned update for the same
    // record must not supersede it.
    outbox.enqueue(MutationEvent::update("Post", "1", data("later"))).await;
    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, claimed.id);
}

#[tokio::test]
async fn dequeue_removes_claimed_head() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("a"))).await;
    outbox.peek().await.unwrap();

    let done = outbox.dequeue(None).await.unwrap();
    assert_eq!(done.model_id, "1");
    assert!(outbox.is_empty().await);
    assert!(outbox.dequeue(None).await.is_none());
}

// ── Version-stamp propagation ────────────────────────────────────

#[tokio::test]
async fn dequeue_propagates_newer_version_to_queued_events() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("sent"))).await;
    outbox
        .enqueue(MutationEvent::update("Post", "1", data("queued")).with_condition(condition()))
        .await;
    outbox.peek().await.unwrap();

    let acked = data("sent").with_version(7).with_last_changed_at(1_700_000_000_000);
    outbox.dequeue(Some(&acked)).await.unwrap();

    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].data.version(), Some(7));
    assert_eq!(pending[0].data.last_changed_at(), Some(1_700_000_000_000));
    assert_eq!(pending[0].version, Some(7));
}

#[tokio::test]
async fn dequeue_never_downgrades_version_stamps() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("sent"))).await;
    outbox
        .enqueue(
            MutationEvent::update("Post", "1", data("queued").with_version(9))
                .with_condition(condition()),
        )
        .await;
    outbox.peek().await.unwrap();

    outbox.dequeue(Some(&data("sent").with_version(7))).await.unwrap();

    let pending = outbox.get_for_model("1").await;
    assert_eq!(pending[0].data.version(), Some(9));
}

#[tokio::test]
async fn dequeue_ignores_other_records() {
    let outbox = MutationOutbox::new();
    outbox.enqueue(MutationEvent::update("Post", "1", data("a"))).await;
    outbox.enqueue(MutationEvent::update("Post", "2", data("b"))).await;
    outbox.peek().await.unwrap();

    outbox.dequeue(Some(&data("a").with_version(5))).await.unwrap();
    let other = outbox.get_for_model("2").await;
    assert_eq!(other[0].data.version(), None);
}

// ── Wire shape ───────────────────────────────────────────────────

#[test]
fn conditioned_event_roundtrips_range_condition() {
    let model = SchemaModel::new(
        "Post",
        vec![ModelField::id("id"), ModelField::int("rating")],
    );
    let range = PredicateBuilder::new(&model)
        .between("rating", 2, 4)
        .unwrap()
        .build();
    let event = MutationEvent::update("Post", "1", data("a")).with_condition(range);

    let back: MutationEvent =
        serde_json::from_value(serde_json::to_value(&event).unwrap()).unwrap();
    assert_eq!(back, event);
}

#[test]
fn event_serializes_camel_case() {
    let event = MutationEvent::create("Post", "1", data("a")).with_version(3);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json.get("modelName"), Some(&json!("Post")));
    assert_eq!(json.get("modelId"), Some(&json!("1")));
    assert_eq!(json.get("operation"), Some(&json!("CREATE")));
    assert_eq!(json.get("_version"), Some(&json!(3)));
    assert!(json.get("condition").is_none());
}
