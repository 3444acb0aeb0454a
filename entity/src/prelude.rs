pub use super::comments::Entity as Comments;
pub use super::contacts::Entity as Contacts;
pub use super::conversation_members::Entity as ConversationMembers;
pub use super::conversations::Entity as Conversations;
pub use super::message_reads::Entity as MessageReads;
pub use super::messages::Entity as Messages;
pub use super::reactions::Entity as Reactions;
pub use super::users::Entity as Users;
