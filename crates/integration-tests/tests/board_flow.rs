//! Full fetch → build → mutate → re-fetch cycles through the coordinator,
//! against both store implementations.

use std::sync::Arc;

use nb_core::{BoardStore, Session, ThreadPath, VoteDirection, VoteOutcome};
use nb_store_memory::MemoryBoardStore;
use nb_store_sqlite::SqliteBoardStore;
use nb_view::{ReplyOutcome, ThreadView};
use uuid::Uuid;

fn user(name: &str) -> Session {
    Session::new(Uuid::now_v7(), name)
}

/// Seeds one post with a small nested thread and returns its id.
async fn seed_thread(store: &dyn BoardStore, op: &Session, replier: &Session) -> Uuid {
    let post_id = store
        .create_post(op, "test post", "test contents")
        .await
        .unwrap();
    let depth1 = ThreadPath::root().child(post_id);
    let first = store
        .create_comment(replier, "test comment", &depth1)
        .await
        .unwrap();
    store
        .create_comment(op, "nested answer", &depth1.child(first))
        .await
        .unwrap();
    store
        .create_comment(replier, "second top-level", &depth1)
        .await
        .unwrap();
    post_id
}

async fn whole_cycle_against(store: Arc<dyn BoardStore>) {
    let ada = user("ada");
    let grace = user("grace");
    let post_id = seed_thread(store.as_ref(), &ada, &grace).await;

    let view = ThreadView::new(store.clone(), post_id);

    // Initial load: nested shape and sibling order.
    let state = view.refresh(Some(&ada)).await;
    let snapshot = state.snapshot().expect("thread should load");
    assert_eq!(snapshot.post.title, "test post");
    assert_eq!(snapshot.post.comments.len(), 2);
    assert_eq!(snapshot.post.comments[0].content, "test comment");
    assert_eq!(snapshot.post.comments[0].comments.len(), 1);
    assert_eq!(snapshot.post.comments[1].content, "second top-level");
    assert!(snapshot.my_votes.is_empty());

    // Vote through the coordinator: accepted, then visible in the refreshed
    // snapshot without any manual re-fetch.
    let outcome = view.vote(&ada, post_id, VoteDirection::Up).await;
    assert_eq!(outcome, VoteOutcome::Accepted);
    let state = view.state().await;
    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.post.score, 1);
    assert_eq!(snapshot.my_votes.get(&post_id), Some(&VoteDirection::Up));

    // Flip: one observable transition of two.
    view.vote(&ada, post_id, VoteDirection::Down).await;
    let state = view.state().await;
    assert_eq!(state.snapshot().unwrap().post.score, -1);

    // Reply to the nested comment; it must appear under its parent.
    let parent = {
        let state = view.state().await;
        state.snapshot().unwrap().post.comments[0].comments[0].clone()
    };
    let outcome = view
        .reply(&grace, &parent.path, parent.id, "third level")
        .await;
    let comment_id = match outcome {
        ReplyOutcome::Posted { comment_id } => comment_id,
        other => panic!("reply failed: {other:?}"),
    };
    let state = view.state().await;
    let snapshot = state.snapshot().unwrap();
    let nested = &snapshot.post.comments[0].comments[0].comments;
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].id, comment_id);
    assert_eq!(nested[0].path.depth(), 3);
}

#[tokio::test]
async fn whole_cycle_on_the_memory_store() {
    whole_cycle_against(Arc::new(MemoryBoardStore::new())).await;
}

#[tokio::test]
async fn whole_cycle_on_the_sqlite_store() {
    let store = SqliteBoardStore::in_memory().await.unwrap();
    whole_cycle_against(Arc::new(store)).await;
}

#[tokio::test]
async fn two_voters_and_a_flip_settle_at_zero_through_the_view() {
    let store: Arc<dyn BoardStore> = Arc::new(MemoryBoardStore::new());
    let ada = user("ada");
    let grace = user("grace");
    let post_id = store
        .create_post(&ada, "scores", "contents")
        .await
        .unwrap();

    let view = ThreadView::new(store.clone(), post_id);
    view.vote(&ada, post_id, VoteDirection::Up).await;
    view.vote(&grace, post_id, VoteDirection::Up).await;
    let state = view.state().await;
    assert_eq!(state.snapshot().unwrap().post.score, 2);

    view.vote(&grace, post_id, VoteDirection::Down).await;
    let state = view.state().await;
    assert_eq!(state.snapshot().unwrap().post.score, 0);
}
