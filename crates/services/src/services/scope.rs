use db::{
    models::{task::Task, user::User},
    types::TaskType,
};

pub fn same_department(task: &Task, user: &User) -> bool {
    user.department_id == Some(task.department_id)
}

/// Strict comparison; a task without a division matches nobody.
pub fn same_division(task: &Task, user: &User) -> bool {
    task.division_id.is_some() && user.division_id == task.division_id
}

/// UNIT auctions narrow to the task's division when it has one.
pub fn requires_division(task: &Task) -> bool {
    task.task_type == TaskType::Unit && task.division_id.is_some()
}
