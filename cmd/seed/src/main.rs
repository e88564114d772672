//! Seeds a demo board: three users, one thread with nested replies, and a
//! few votes, so a fresh checkout has something to look at.

use fake::faker::name::en::Name;
use fake::Fake;
use nb_core::{BoardStore, Session, ThreadPath, VoteDirection};
use nb_store_sqlite::SqliteBoardStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn demo_user() -> Session {
    Session::new(Uuid::now_v7(), Name().fake::<String>())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("NESTBOARD_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:nestboard.db".to_string());
    let store = SqliteBoardStore::connect(&url).await?;

    let op = demo_user();
    let first = demo_user();
    let second = demo_user();

    let post_id = store
        .create_post(
            &op,
            "Welcome to Nestboard",
            "This thread was planted by cmd/seed. Say hello below.",
        )
        .await?;
    let depth1 = ThreadPath::root().child(post_id);

    let hello = store
        .create_comment(&first, "First! Hello from the seed tool.", &depth1)
        .await?;
    store
        .create_comment(&second, "Replies nest arbitrarily deep.", &depth1.child(hello))
        .await?;
    store
        .create_comment(&second, "And siblings keep their posting order.", &depth1)
        .await?;

    store.cast_vote(post_id, first.user_id, VoteDirection::Up).await?;
    store.cast_vote(post_id, second.user_id, VoteDirection::Up).await?;
    store.cast_vote(hello, op.user_id, VoteDirection::Up).await?;

    info!(%post_id, %url, "seeded demo thread");
    println!("seeded post {post_id} into {url}");
    Ok(())
}
