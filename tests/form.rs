mod scenarii;

use std::sync::Arc;

use service_sync::error::{FormError, ValidationError};
use service_sync::form::{FormMode, FormState, SchedulingForm};
use service_sync::mock_behaviour::MockBehaviour;
use service_sync::store::memory_store::{MemoryStore, StoreCall};
use service_sync::task::TaskState;
use service_sync::RecordId;

use scenarii::{BATHROOM_DRAIN_ID, KITCHEN_SINK_ID};

#[tokio::test]
async fn create_a_task() {
    scenarii::init_logs();
    let store = Arc::new(MemoryStore::new());
    let mut tasks = scenarii::task_repository(&store);
    let mut form = SchedulingForm::new();

    form.open_create(Some("2025-03-24T09:00")).unwrap();
    {
        let buffer = form.buffer_mut().unwrap();
        buffer.title = "Fix Kitchen Sink Clog".to_string();
        buffer.end = "2025-03-24T10:00".to_string();
    }
    // nothing is sent while editing
    assert!(store.journal().is_empty());

    let task = form.submit(&mut tasks).await.unwrap().unwrap();
    assert!(form.is_idle());
    assert_eq!(task.title(), "Fix Kitchen Sink Clog");
    assert_eq!(task.description(), "No description");
    assert_eq!(tasks.items().len(), 1);
    assert_eq!(store.journal(), vec![StoreCall::Write(format!("ServiceSync/{}", task.id()))]);
}

#[tokio::test]
async fn invalid_buffers_stay_in_the_form() {
    scenarii::init_logs();
    let store = Arc::new(MemoryStore::new());
    let mut tasks = scenarii::task_repository(&store);
    let mut form = SchedulingForm::new();

    form.open_create(None).unwrap();
    form.buffer_mut().unwrap().title = "Leaking pipe".to_string();
    let err = form.submit(&mut tasks).await.unwrap_err();
    assert!(matches!(err, FormError::Validation(ValidationError::MissingStart)));
    assert_eq!(form.state().name(), "editing");
    assert_eq!(form.buffer().map(|b| b.title.as_str()), Some("Leaking pipe"));
    assert!(store.journal().is_empty());

    form.buffer_mut().unwrap().start = "tomorrow morning".to_string();
    assert!(matches!(form.submit(&mut tasks).await, Err(FormError::Validation(ValidationError::InvalidTimestamp { .. }))));

    form.cancel();
    assert!(form.is_idle());
    assert!(store.journal().is_empty());
    assert!(tasks.items().is_empty());
}

#[tokio::test]
async fn store_failures_keep_the_buffer() {
    scenarii::init_logs();
    let store = scenarii::populated_store();
    let mut tasks = scenarii::task_repository(&store);
    tasks.load().await;
    let sink = tasks.get(&RecordId::from(KITCHEN_SINK_ID)).unwrap().clone();
    let mut form = SchedulingForm::new();

    form.open_update(&sink).unwrap();
    form.buffer_mut().unwrap().status = TaskState::Completed.into();
    store.set_behaviour(MockBehaviour { patch_behaviour: (0, 1), ..MockBehaviour::default() });

    assert!(matches!(form.submit(&mut tasks).await, Err(FormError::Store(_))));
    match form.state() {
        FormState::Failed { mode, buffer, .. } => {
            assert_eq!(mode, &FormMode::Update(sink.id().clone()));
            assert_eq!(buffer.status.state(), Some(TaskState::Completed));
        },
        other => panic!("Unexpected state {:?}", other),
    }
    assert_eq!(tasks.get(sink.id()).and_then(|t| t.status().state()), Some(TaskState::Pending));

    // submitting again
    let updated = form.submit(&mut tasks).await.unwrap().unwrap();
    assert!(form.is_idle());
    assert_eq!(updated.status().state(), Some(TaskState::Completed));
    assert_eq!(updated.created_at(), sink.created_at());
    assert_eq!(tasks.get(sink.id()), Some(&updated));
}

#[tokio::test]
async fn delete_after_confirmation() {
    scenarii::init_logs();
    let store = scenarii::populated_store();
    let mut tasks = scenarii::task_repository(&store);
    tasks.load().await;
    let drain = tasks.get(&RecordId::from(BATHROOM_DRAIN_ID)).unwrap().clone();
    let mut form = SchedulingForm::new();

    form.open_update(&drain).unwrap();
    assert!(form.confirm_delete(&mut tasks).await.is_err());
    form.request_delete().unwrap();
    assert!(form.submit(&mut tasks).await.is_err());

    store.set_behaviour(MockBehaviour { delete_behaviour: (0, 1), ..MockBehaviour::default() });
    store.clear_journal();
    assert!(matches!(form.confirm_delete(&mut tasks).await, Err(FormError::Store(_))));
    assert_eq!(form.state().name(), "failed");
    assert_eq!(tasks.items().len(), 2);

    form.request_delete().unwrap();
    assert!(form.confirm_delete(&mut tasks).await.unwrap());
    assert!(form.is_idle());
    assert!(tasks.get(drain.id()).is_none());
    assert!(tasks.get(&RecordId::from(KITCHEN_SINK_ID)).is_some());
    let deletion = StoreCall::Delete(format!("ServiceSync/{}", BATHROOM_DRAIN_ID));
    assert_eq!(store.journal(), vec![deletion.clone(), deletion]);
}

#[tokio::test]
async fn records_deleted_meanwhile() {
    scenarii::init_logs();
    let store = scenarii::populated_store();
    let mut tasks = scenarii::task_repository(&store);
    tasks.load().await;
    let drain = tasks.get(&RecordId::from(BATHROOM_DRAIN_ID)).unwrap().clone();

    let mut form = SchedulingForm::new();
    form.open_update(&drain).unwrap();
    tasks.delete(drain.id()).await.unwrap();

    form.buffer_mut().unwrap().title = "Repair Bathroom Drain (urgent)".to_string();
    assert!(form.submit(&mut tasks).await.unwrap().is_none());
    assert!(form.is_idle());
    assert!(tasks.get(drain.id()).is_none());
}
