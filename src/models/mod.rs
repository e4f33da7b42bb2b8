pub mod task;
pub mod user;

pub use task::{
    AssignTaskInput, CreateTaskInput, DeleteTaskInput, NewTask, Task, TaskChanges, TaskFilter,
    TaskQuery, TaskStats, TaskStatus, UpdateTaskInput,
};
pub use user::{normalize_email, Assignee, NewUser, Role, User, UserSummary};
