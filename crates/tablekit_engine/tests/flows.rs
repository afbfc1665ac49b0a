//! End-to-end flow tests over the in-memory service fakes.

use std::sync::Arc;

use tablekit_engine::{
    affordances_for, apply_filters, clear_filters, Action, AuthzOracle, EngineConfig, FormFlow,
    RelationResolver, ResourceAcl, SchemaFlow, SubmitOutcome, ViewCache,
};
use tablekit_forms::{FilterForm, FilterValue, FormState, FormValue, RelationChoice, SelectOption};
use tablekit_protocol::{ErrorCause, QueryState, Resource, ServiceError, Value};
use tablekit_schema::{FieldConfiguration, RelationTarget, SchemaCatalog};
use tablekit_test_utils::{fixtures, InMemoryFiles, InMemoryRows, InMemoryTables, OwnerOracle};

fn flow(rows: Arc<InMemoryRows>) -> (FormFlow, Arc<ViewCache>) {
    let cache = Arc::new(ViewCache::default());
    let flow = FormFlow::new(rows, Arc::new(InMemoryFiles::new()), cache.clone());
    (flow, cache)
}

#[tokio::test]
async fn submit_creates_then_updates_the_same_row() {
    let table = fixtures::table("tasks", vec![fixtures::required_text_field("title")]);
    let rows = Arc::new(InMemoryRows::new());
    let (flow, cache) = flow(rows.clone());

    let mut form = FormState::new(&table);
    form.set("title", FormValue::Text("write tests".into()));

    let SubmitOutcome::Saved(created) = flow.submit(&mut form).await else {
        panic!("expected a saved row");
    };
    assert_eq!(rows.count("tasks"), 1);
    assert_eq!(form.row_id(), Some(&created.id));
    assert!(!form.is_dirty());
    assert_eq!(cache.get_row("tasks", &created.id), Some(created.clone()));

    form.set("title", FormValue::Text("write more tests".into()));
    let SubmitOutcome::Saved(updated) = flow.submit(&mut form).await else {
        panic!("expected a saved row");
    };
    assert_eq!(updated.id, created.id);
    assert_eq!(rows.count("tasks"), 1);
    assert_eq!(
        cache.get_row("tasks", &created.id).unwrap().value("title"),
        &Value::Text("write more tests".into())
    );
}

#[tokio::test]
async fn invalid_forms_never_reach_the_service() {
    let table = fixtures::table("tasks", vec![fixtures::required_text_field("title")]);
    let rows = Arc::new(InMemoryRows::new());
    let (flow, _cache) = flow(rows.clone());

    let mut form = FormState::new(&table);
    let SubmitOutcome::Invalid(violations) = flow.submit(&mut form).await else {
        panic!("expected local validation failure");
    };
    assert_eq!(violations[0].message, "title is required");
    assert_eq!(rows.count("tasks"), 0);
}

#[tokio::test]
async fn field_identifiable_rejections_attach_to_the_field() {
    let table = fixtures::table("tasks", vec![fixtures::required_text_field("title")]);
    let rows = Arc::new(InMemoryRows::new());
    let (flow, _cache) = flow(rows.clone());

    rows.fail_next(
        ServiceError::new(
            ErrorCause::AlreadyExists(Resource::Row),
            "a task with this title already exists",
        )
        .for_field("title"),
    );

    let mut form = FormState::new(&table);
    form.set("title", FormValue::Text("duplicate".into()));
    let SubmitOutcome::Rejected(err) = flow.submit(&mut form).await else {
        panic!("expected a rejection");
    };
    assert!(err.is_field_identifiable());
    assert_eq!(
        form.entry("title").unwrap().server_error.as_deref(),
        Some("a task with this title already exists")
    );
    // the entered value survives for correction
    assert_eq!(form.value("title").unwrap().as_text(), Some("duplicate"));
}

#[tokio::test]
async fn other_rejections_leave_the_form_intact_for_retry() {
    let table = fixtures::table("tasks", vec![fixtures::required_text_field("title")]);
    let rows = Arc::new(InMemoryRows::new());
    let (flow, _cache) = flow(rows.clone());

    rows.fail_next(ServiceError::new(ErrorCause::ServerError, "backend down"));
    let mut form = FormState::new(&table);
    form.set("title", FormValue::Text("keep me".into()));

    let SubmitOutcome::Rejected(err) = flow.submit(&mut form).await else {
        panic!("expected a rejection");
    };
    assert!(!err.is_field_identifiable());
    assert!(form.entry("title").unwrap().server_error.is_none());
    assert_eq!(form.value("title").unwrap().as_text(), Some("keep me"));

    let SubmitOutcome::Saved(_) = flow.submit(&mut form).await else {
        panic!("retry should succeed");
    };
}

#[tokio::test]
async fn group_entry_delete_must_succeed_before_local_removal() {
    let nested = fixtures::group_table("address", vec![fixtures::text_field("street")]);
    let parent = fixtures::table(
        "people",
        vec![
            fixtures::required_text_field("name"),
            fixtures::group_field("addresses", &nested),
        ],
    );
    let mut catalog = SchemaCatalog::new();
    catalog.insert(nested.clone());

    let rows = Arc::new(InMemoryRows::new());
    let stored_entry = fixtures::row(&[("street", "Elm St")]);
    let entry_id = rows.seed("address", stored_entry.clone());

    let mut person = fixtures::row(&[("name", "Ana")]);
    person.set_value("addresses", Value::Rows(vec![stored_entry]));
    rows.seed("people", person.clone());

    let (flow, _cache) = flow(rows.clone());
    let mut form = FormState::from_row(&parent, &catalog, &person);
    assert_eq!(
        form.value("addresses").unwrap().as_group().unwrap().len(),
        1
    );

    // referenced: the delete fails and the entry stays visible
    rows.mark_in_use(entry_id.clone());
    let err = flow
        .remove_group_entry(&mut form, "addresses", 0)
        .await
        .unwrap_err();
    assert_eq!(err.cause, ErrorCause::InUse(Resource::Row));
    assert_eq!(
        form.value("addresses").unwrap().as_group().unwrap().len(),
        1
    );
    assert!(rows.stored("address", &entry_id).is_some());

    // a never-persisted entry needs no remote call
    form.append_group_entry("addresses", &catalog);
    assert!(flow
        .remove_group_entry(&mut form, "addresses", 1)
        .await
        .unwrap());
}

#[tokio::test]
async fn load_page_reads_through_the_cache() {
    let rows = Arc::new(InMemoryRows::new());
    rows.seed("tasks", fixtures::row(&[("title", "one")]));
    let (flow, cache) = flow(rows.clone());

    let query = QueryState::new();
    let first = flow.load_page("tasks", &query).await.unwrap();
    assert_eq!(first.items.len(), 1);

    // a second fetch is served from the cache even after the backend moved on
    rows.seed("tasks", fixtures::row(&[("title", "two")]));
    let second = flow.load_page("tasks", &query).await.unwrap();
    assert_eq!(second.items.len(), 1);

    cache.invalidate_table("tasks");
    let third = flow.load_page("tasks", &query).await.unwrap();
    assert_eq!(third.items.len(), 2);
}

#[tokio::test]
async fn trashed_rows_move_between_cached_views() {
    let rows = Arc::new(InMemoryRows::new());
    let id = rows.seed("tasks", fixtures::row(&[("title", "old")]));
    let (flow, _cache) = flow(rows.clone());

    let active = QueryState::new();
    assert_eq!(flow.load_page("tasks", &active).await.unwrap().items.len(), 1);

    let trashed = flow.trash_row("tasks", &id).await.unwrap();
    assert!(trashed.trashed);
    // the active view was patched in place, no refetch
    assert!(flow.load_page("tasks", &active).await.unwrap().items.is_empty());

    let restored = flow.restore_row("tasks", &id).await.unwrap();
    assert!(!restored.trashed);
    assert!(restored.trashed_at.is_none());
}

#[tokio::test]
async fn responses_append_per_user_and_replace_on_repeat() {
    let rows = Arc::new(InMemoryRows::new());
    let row = fixtures::row(&[]);
    rows.seed("tasks", row.clone());
    let (flow, _cache) = flow(rows.clone());

    flow.submit_response("tasks", &row, "rating", "ana", serde_json::json!(3))
        .await
        .unwrap();
    let stored = rows.stored("tasks", &row.id).unwrap();
    let updated = flow
        .submit_response("tasks", &stored, "rating", "ana", serde_json::json!(5))
        .await
        .unwrap();

    let responses = updated.value("rating").as_responses().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].value, serde_json::json!(5));
}

#[tokio::test]
async fn filters_apply_and_clear_preserving_reserved_params() {
    let table = fixtures::table(
        "tasks",
        vec![
            fixtures::text_field("name"),
            fixtures::dropdown_field("status", &["open", "closed"]),
        ],
    );
    let catalog = SchemaCatalog::new();
    let mut form = FilterForm::new(&table, &catalog);
    form.set("name", FilterValue::Text("x".into()));
    form.set(
        "status",
        FilterValue::Selections(vec!["open".into(), "closed".into()]),
    );

    let mut query = QueryState::decode("page=3&perPage=50");
    apply_filters(&mut query, &form);
    assert_eq!(query.get("name"), Some("x"));
    assert_eq!(query.get("status"), Some("open,closed"));
    assert_eq!(query.page(), 1);
    assert_eq!(query.per_page(25), 50);

    let mut query = QueryState::decode("name=x&status=open,closed&page=3&perPage=50");
    clear_filters(&mut query, &form);
    assert_eq!(query.page(), 1);
    assert_eq!(query.per_page(25), 50);
    assert!(query.get("name").is_none());
    assert!(query.get("status").is_none());
}

#[tokio::test]
async fn schema_flow_soft_deletes_and_restores_fields() {
    let title = fixtures::required_text_field("title");
    let notes = fixtures::text_field("notes");
    let notes_id = notes.id.clone();
    let table = fixtures::table("tasks", vec![title, notes]);

    let tables = Arc::new(InMemoryTables::new().with_table(table));
    let rows = Arc::new(InMemoryRows::new());
    let row_id = rows.seed("tasks", fixtures::row(&[("title", "t"), ("notes", "keep")]));

    let cache = Arc::new(ViewCache::default());
    let mut schema = SchemaFlow::new(tables.clone(), cache.clone());
    schema.load_table("tasks").await.unwrap();

    let after_trash = schema.trash_field("tasks", &notes_id).await.unwrap();
    assert!(after_trash.field("notes").is_none());
    assert!(!after_trash
        .list_fields()
        .iter()
        .any(|f| f.slug == "notes"));
    // stored data under the trashed slug survives
    let stored = rows.stored("tasks", &row_id).unwrap();
    assert_eq!(stored.value("notes"), &Value::Text("keep".into()));

    let after_restore = schema.restore_field("tasks", &notes_id).await.unwrap();
    assert!(after_restore.field("notes").is_some());
}

#[tokio::test]
async fn trashing_the_last_active_field_is_refused() {
    let title = fixtures::required_text_field("title");
    let title_id = title.id.clone();
    let tables = Arc::new(InMemoryTables::new().with_table(fixtures::table("tasks", vec![title])));
    let mut schema = SchemaFlow::new(tables, Arc::new(ViewCache::default()));
    schema.load_table("tasks").await.unwrap();

    let err = schema.trash_field("tasks", &title_id).await.unwrap_err();
    assert!(matches!(
        err,
        tablekit_engine::EngineError::Service(ref service)
            if service.cause == ErrorCause::LastActiveField
    ));
}

#[tokio::test]
async fn resolver_search_labels_and_reconciles_against_the_fake() {
    let label = fixtures::text_field("name");
    let projects = fixtures::table("projects", vec![label.clone()]);
    let rel = fixtures::relationship_field("project", &projects, &label);
    let FieldConfiguration::Relationship(config) = &rel.configuration else {
        unreachable!()
    };
    let target: RelationTarget = config.relationship.clone();

    let rows = Arc::new(InMemoryRows::new());
    let apollo = rows.seed("projects", fixtures::row(&[("name", "Apollo")]));
    rows.seed("projects", fixtures::row(&[("name", "Gemini")]));

    let mut resolver = RelationResolver::new(rows, target, &EngineConfig::default());
    let ticket = resolver.begin_search("apol");
    assert!(resolver.run(ticket).await);
    assert_eq!(resolver.items().len(), 1);
    assert_eq!(resolver.items()[0].label, "Apollo");

    let mut selection = vec![RelationChoice::unresolved(apollo.to_string())];
    resolver.reconcile(&mut selection).await;
    assert_eq!(selection[0].label, "Apollo");
    assert!(selection[0].resolved);
}

#[tokio::test]
async fn oracle_gates_affordances() {
    let table = fixtures::table("tasks", vec![fixtures::text_field("title")]);
    let acl = ResourceAcl::from(&table.configuration);

    let owner = OwnerOracle::new("owner");
    let affordances = affordances_for(&owner, &acl).await;
    assert!(affordances.create && affordances.update && affordances.delete);

    let visitor = OwnerOracle::new("someone-else");
    let affordances = affordances_for(&visitor, &acl).await;
    assert!(!affordances.create && !affordances.update && !affordances.delete);
    assert!(visitor.can_perform(Action::View, &acl).await);

    let mut collaborative = table.configuration.clone();
    collaborative.collaboration = true;
    let affordances = affordances_for(&visitor, &ResourceAcl::from(&collaborative)).await;
    assert!(affordances.create && !affordances.update);
}

#[tokio::test]
async fn dropdown_submit_round_trips_through_storage() {
    let table = fixtures::table(
        "tasks",
        vec![
            fixtures::required_text_field("title"),
            fixtures::dropdown_field("status", &["open", "closed"]),
        ],
    );
    let rows = Arc::new(InMemoryRows::new());
    let (flow, _cache) = flow(rows.clone());

    let mut form = FormState::new(&table);
    form.set("title", FormValue::Text("t".into()));
    form.set(
        "status",
        FormValue::Options(vec![SelectOption::plain("open")]),
    );
    let SubmitOutcome::Saved(saved) = flow.submit(&mut form).await else {
        panic!("expected a saved row");
    };
    assert_eq!(
        saved.value("status"),
        &Value::Strings(vec!["open".into()])
    );

    let catalog = SchemaCatalog::new();
    let reopened = FormState::from_row(&table, &catalog, &saved);
    let options = reopened.value("status").unwrap().as_options().unwrap();
    assert_eq!(options[0].value, "open");
}
