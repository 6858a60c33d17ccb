//! Conversation history persistence across storage handles
//!
//! Storage opens a connection per operation, so separate handles on the
//! same database file must observe each other's writes. These tests
//! mimic a chat process writing history and a later `history` command
//! reading it back.

mod common;

use regchat::models::{Attachment, Message};
use regchat::storage::{ConversationStore, SqliteStorage};

#[test]
fn test_history_visible_across_handles() {
    let (writer, _tmp) = common::create_temp_storage();
    let reader = SqliteStorage::new_with_path(writer.db_path()).expect("reader handle");

    let conversation = writer.create_conversation("Stability testing").expect("create");
    writer
        .insert_message(&conversation.id, &Message::user("What is ICH Q1A?"))
        .expect("insert user");
    writer
        .insert_message(
            &conversation.id,
            &Message::assistant("ICH Q1A covers stability testing of new drug substances."),
        )
        .expect("insert assistant");

    let conversations = reader.list_conversations().expect("list");
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Stability testing");

    let messages = reader.load_messages(&conversation.id).expect("load");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "What is ICH Q1A?");
}

#[test]
fn test_attachments_round_trip_through_storage() {
    let (storage, _tmp) = common::create_temp_storage();

    let conversation = storage.create_conversation("Batch records").expect("create");
    let message = Message::user_with_attachments(
        "See the attached batch record",
        vec![Attachment::file(
            "batch-042.pdf",
            "data:application/pdf;base64,AAAA",
        )],
    );
    storage
        .insert_message(&conversation.id, &message)
        .expect("insert");

    let loaded = storage.load_messages(&conversation.id).expect("load");
    assert_eq!(loaded[0].attachments.len(), 1);
    assert_eq!(loaded[0].attachments[0].name, "batch-042.pdf");
    assert_eq!(
        loaded[0].attachments[0].url,
        "data:application/pdf;base64,AAAA"
    );
}

#[test]
fn test_delete_conversation_cascades_across_handles() {
    let (writer, _tmp) = common::create_temp_storage();
    let reader = SqliteStorage::new_with_path(writer.db_path()).expect("reader handle");

    let doomed = writer.create_conversation("Doomed").expect("create");
    writer
        .insert_message(&doomed.id, &Message::user("q"))
        .expect("insert");
    let kept = writer.create_conversation("Kept").expect("create");

    reader.delete_conversation(&doomed.id).expect("delete");

    let conversations = writer.list_conversations().expect("list");
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].id, kept.id);
    assert!(writer.load_messages(&doomed.id).expect("load").is_empty());
}

#[test]
fn test_delete_all_leaves_usable_database() {
    let (storage, _tmp) = common::create_temp_storage();

    storage.create_conversation("A").expect("create");
    storage.create_conversation("B").expect("create");
    storage.delete_all().expect("clear");

    assert!(storage.list_conversations().expect("list").is_empty());

    // The schema survives a full clear.
    let conversation = storage.create_conversation("After clear").expect("create");
    storage
        .insert_message(&conversation.id, &Message::user("still works"))
        .expect("insert");
    assert_eq!(storage.load_messages(&conversation.id).expect("load").len(), 1);
}
