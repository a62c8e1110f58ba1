use std::time::Duration;

use crate::context::Context;

#[tokio::test]
async fn test_cancel_wakes_tasks() {
    let (ctx, handler) = Context::new();

    let task_ctx = ctx.clone();
    let task = tokio::spawn(async move {
        task_ctx.done().await;
    });

    drop(ctx);

    tokio::time::timeout(Duration::from_secs(1), handler.cancel())
        .await
        .expect("cancel did not resolve");

    task.await.expect("task did not finish");
}

#[tokio::test]
async fn test_done_waits_for_all_clones() {
    let (ctx, mut handler) = Context::new();
    let ctx2 = ctx.clone();

    assert!(!ctx.is_done());

    let wait = tokio::spawn(async move { handler.done().await });

    drop(ctx);
    tokio::task::yield_now().await;
    assert!(!wait.is_finished());

    drop(ctx2);
    tokio::time::timeout(Duration::from_secs(1), wait)
        .await
        .expect("handler.done() did not resolve")
        .unwrap();
}
