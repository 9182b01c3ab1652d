pub mod draft_editor;
pub mod ticket_list;
