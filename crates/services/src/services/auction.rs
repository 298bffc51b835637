use chrono::{DateTime, Utc};
use db::{
    ConnectionTrait, DBService, TransactionTrait,
    events::{
        AuctionClosedPayload, AuctionWindowPayload, BidPlacedPayload, EVENT_AUCTION_BID_PLACED,
        EVENT_AUCTION_CLOSED, EVENT_AUCTION_EXTENDED, EVENT_AUCTION_OPENED,
        EVENT_TASK_STATUS_CHANGED, TaskStatusChangedPayload,
    },
    models::{
        auction_bid::{AuctionBid, CreateAuctionBid},
        event_outbox::EventOutbox,
        task::{CreateTask, Task},
        user::User,
    },
    types::{AuctionMode, Grade, Money, TaskStatus},
};
use serde::Serialize;
use tracing::{debug, error, info};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::AuctionConfig,
    eligibility::{self, BidEligibility, Visibility},
    error::{AuctionConflict, AuctionError, Result},
    grade::{GradeLedger, GradeProgress},
    lifecycle::{self, CloseOutcome, DisplayStatus, SweepAction},
    locks::TaskLocks,
    ratchet::{self, BidSubmission},
};

const TASK_ENTITY: &str = "task";

#[derive(Debug, Clone, Serialize, TS)]
pub struct TaskView {
    pub task: Task,
    pub display_status: DisplayStatus,
    /// Seconds until the planned close; absent when no auction was opened.
    pub seconds_remaining: Option<i64>,
}

impl TaskView {
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        Self {
            display_status: lifecycle::display_status(&task, now),
            seconds_remaining: seconds_remaining(&task, now),
            task,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct AuctionListing {
    pub task: Task,
    pub display_status: DisplayStatus,
    pub seconds_remaining: Option<i64>,
    pub eligibility: BidEligibility,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct BidReceipt {
    pub bid: AuctionBid,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum GradeSource {
    Explicit,
    Points,
    Role,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct UserGrade {
    pub user_id: Uuid,
    pub grade: Grade,
    pub source: GradeSource,
    pub points: i64,
    /// Distance to the next grade; only meaningful when points decide the grade.
    pub progress: Option<GradeProgress>,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
pub struct SweepReport {
    pub examined: usize,
    pub extended: Vec<Uuid>,
    pub closed: Vec<Uuid>,
    /// Tasks another worker changed under us; they are picked up next round.
    pub skipped: usize,
    /// Tasks whose pass errored. The rest of the sweep still runs.
    pub failed: Vec<Uuid>,
    pub pruned_locks: usize,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.extended.is_empty() && self.closed.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, task_id: Uuid, result: Result<SweepResult>) {
        match result {
            Ok(SweepResult::Idle) => {}
            Ok(SweepResult::Extended) => self.extended.push(task_id),
            Ok(SweepResult::Closed) => self.closed.push(task_id),
            Err(AuctionError::Conflict(AuctionConflict::StaleState)) => {
                debug!(%task_id, "task changed during sweep, skipping");
                self.skipped += 1;
            }
            Err(err) => {
                error!(%task_id, error = %err, "auction sweep failed for task");
                self.failed.push(task_id);
            }
        }
    }
}

enum SweepResult {
    Idle,
    Extended,
    Closed,
}

/// Entry point for every auction operation. Mutations on one task run inside
/// that task's lock and a single transaction, and the row write is a
/// compare-and-swap on the task version.
#[derive(Clone)]
pub struct AuctionService {
    db: DBService,
    config: AuctionConfig,
    ledger: GradeLedger,
    locks: TaskLocks,
}

impl AuctionService {
    pub fn new(db: DBService, config: AuctionConfig) -> Self {
        let ledger = GradeLedger::new(config.grade_thresholds);
        Self {
            db,
            config,
            ledger,
            locks: TaskLocks::new(),
        }
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &GradeLedger {
        &self.ledger
    }

    pub fn locks(&self) -> &TaskLocks {
        &self.locks
    }

    async fn load_task<C: ConnectionTrait>(db: &C, task_id: Uuid) -> Result<Task> {
        Task::find_by_id(db, task_id)
            .await?
            .ok_or(AuctionError::TaskNotFound)
    }

    /// Loads a user with `grade` resolved: an explicit grade is kept, otherwise
    /// a user with ledger entries gets the grade their points earn. Users with
    /// neither fall through to the role table during eligibility checks.
    pub async fn load_participant(&self, user_id: Uuid) -> Result<User> {
        let mut user = User::find_by_id(&self.db.pool, user_id)
            .await?
            .ok_or(AuctionError::UserNotFound)?;
        if user.grade.is_none() && user.point_entries > 0 {
            user.grade = Some(self.ledger.grade_of(user.points as f64));
        }
        Ok(user)
    }

    pub async fn user_grade(&self, user_id: Uuid) -> Result<UserGrade> {
        let user = User::find_by_id(&self.db.pool, user_id)
            .await?
            .ok_or(AuctionError::UserNotFound)?;
        let (grade, source) = match user.grade {
            Some(grade) => (grade, GradeSource::Explicit),
            None if user.point_entries > 0 => {
                (self.ledger.grade_of(user.points as f64), GradeSource::Points)
            }
            None => (
                eligibility::role_fallback_grade(user.role),
                GradeSource::Role,
            ),
        };
        let progress =
            (source == GradeSource::Points).then(|| self.ledger.progress(user.points as f64));
        Ok(UserGrade {
            user_id,
            grade,
            source,
            points: user.points,
            progress,
        })
    }

    fn validate_new_task(data: &CreateTask) -> Result<()> {
        if data.title.trim().is_empty() {
            return Err(AuctionError::InvalidTask("title is required".to_string()));
        }
        if data.base_price.is_some_and(|price| !price.is_positive()) {
            return Err(AuctionError::InvalidTask("base_price must be positive".to_string()));
        }
        if data.base_time_minutes.is_some_and(|minutes| minutes <= 0) {
            return Err(AuctionError::InvalidTask(
                "base_time_minutes must be positive".to_string(),
            ));
        }
        if data.task_type.is_auctioned() {
            let has_opening = match data.mode {
                AuctionMode::Money => data.base_price.is_some(),
                AuctionMode::Time => data.base_time_minutes.is_some(),
            };
            if !has_opening {
                let field = match data.mode {
                    AuctionMode::Money => "base_price",
                    AuctionMode::Time => "base_time_minutes",
                };
                return Err(AuctionError::InvalidTask(format!(
                    "{field} is required for {} auctions",
                    data.mode
                )));
            }
        }
        Ok(())
    }

    /// Stores a new task; anything but an INDIVIDUAL task opens its auction at once.
    pub async fn create_task(&self, creator_id: Uuid, data: CreateTask) -> Result<Task> {
        Self::validate_new_task(&data)?;
        let now = Utc::now();

        let txn = self.db.pool.begin().await?;
        let task = Task::create(&txn, &data, creator_id, Uuid::new_v4()).await?;
        let task = if task.task_type.is_auctioned() {
            self.open_in(&txn, &task, now).await?.unwrap_or(task)
        } else {
            task
        };
        txn.commit().await?;

        info!(task_id = %task.id, task_type = %task.task_type, mode = %task.mode, "task created");
        Ok(task)
    }

    pub async fn open_auction(&self, task_id: Uuid) -> Result<Task> {
        let _guard = self.locks.lock(task_id).await;
        let txn = self.db.pool.begin().await?;
        let task = Self::load_task(&txn, task_id).await?;
        let opened = self.open_in(&txn, &task, Utc::now()).await?;
        txn.commit().await?;
        Ok(opened.unwrap_or(task))
    }

    async fn open_in<C: ConnectionTrait>(
        &self,
        txn: &C,
        task: &Task,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let Some(next) = lifecycle::open_auction(task, now, &self.config)? else {
            return Ok(None);
        };
        let saved = Task::save_state(txn, &next).await?;
        let planned_end_at = saved.auction_planned_end_at.unwrap_or(now);
        EventOutbox::enqueue(
            txn,
            EVENT_AUCTION_OPENED,
            TASK_ENTITY,
            saved.id,
            &AuctionWindowPayload {
                task_id: saved.id,
                planned_end_at,
            },
        )
        .await?;
        info!(task_id = %saved.id, %planned_end_at, "auction opened");
        Ok(Some(saved))
    }

    pub async fn get_task(&self, task_id: Uuid, now: DateTime<Utc>) -> Result<TaskView> {
        let task = Self::load_task(&self.db.pool, task_id).await?;
        Ok(TaskView::new(task, now))
    }

    pub async fn evaluate_visibility(&self, task_id: Uuid, user_id: Uuid) -> Result<Visibility> {
        let task = Self::load_task(&self.db.pool, task_id).await?;
        let user = self.load_participant(user_id).await?;
        Ok(eligibility::evaluate_visibility(&task, &user))
    }

    pub async fn evaluate_bid_eligibility(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<BidEligibility> {
        let task = Self::load_task(&self.db.pool, task_id).await?;
        let user = self.load_participant(user_id).await?;
        Ok(eligibility::evaluate_bid_eligibility(&task, &user))
    }

    /// Validates and records a bid. The comparison against the current best and
    /// the write happen inside the task's critical section, so a bid that loses a
    /// race is rejected as not improving.
    pub async fn submit_bid(
        &self,
        task_id: Uuid,
        bidder_id: Uuid,
        submission: &BidSubmission,
    ) -> Result<BidReceipt> {
        let bidder = self.load_participant(bidder_id).await?;

        let _guard = self.locks.lock(task_id).await;
        let txn = self.db.pool.begin().await?;
        let task = Self::load_task(&txn, task_id).await?;

        let accepted = ratchet::place_bid(&task, &bidder, submission, Utc::now()).inspect_err(
            |err| debug!(task_id = %task_id, bidder_id = %bidder_id, error = %err, "bid rejected"),
        )?;

        let saved = Task::save_state(&txn, &accepted.task).await?;
        let bid = AuctionBid::create(
            &txn,
            &CreateAuctionBid {
                task_id,
                bidder_id,
                bidder_name: bidder.name.clone(),
                bidder_grade: accepted.bidder_grade,
                bidder_rating: bidder.rating,
                bidder_points: bidder.points,
                value_money: accepted.value.money(),
                value_time_minutes: accepted.value.time_minutes(),
                created_at: accepted.accepted_at,
            },
            Uuid::new_v4(),
        )
        .await?;
        EventOutbox::enqueue(
            &txn,
            EVENT_AUCTION_BID_PLACED,
            TASK_ENTITY,
            task_id,
            &BidPlacedPayload {
                task_id,
                bid_id: bid.id,
                bidder_id,
                value_money: bid.value_money,
                value_time_minutes: bid.value_time_minutes,
            },
        )
        .await?;
        txn.commit().await?;

        info!(
            task_id = %task_id,
            bidder_id = %bidder_id,
            value = %accepted.value,
            "bid accepted"
        );
        Ok(BidReceipt { bid, task: saved })
    }

    pub async fn bids(&self, task_id: Uuid) -> Result<Vec<AuctionBid>> {
        Self::load_task(&self.db.pool, task_id).await?;
        Ok(AuctionBid::find_by_task_id(&self.db.pool, task_id).await?)
    }

    /// Open auctions the user can see, each annotated with whether they may bid.
    pub async fn list_auctions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionListing>> {
        let user = self.load_participant(user_id).await?;
        let tasks = Task::find_open_auctions(&self.db.pool).await?;
        Ok(tasks
            .into_iter()
            .filter(|task| eligibility::evaluate_visibility(task, &user).visible)
            .map(|task| AuctionListing {
                display_status: lifecycle::display_status(&task, now),
                seconds_remaining: seconds_remaining(&task, now),
                eligibility: eligibility::evaluate_bid_eligibility(&task, &user),
                task,
            })
            .collect())
    }

    /// Extends stalled auctions and closes the ones past their planned end.
    /// Safe to run redundantly and from several workers.
    pub async fn sweep_extensions_and_closes(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let candidates = Task::find_open_auctions(&self.db.pool).await?;
        let mut report = SweepReport {
            examined: candidates.len(),
            ..Default::default()
        };

        for task in candidates {
            let result = self.sweep_task(task.id, now).await;
            report.record(task.id, result);
        }

        report.pruned_locks = self.locks.prune_idle();
        Ok(report)
    }

    async fn sweep_task(&self, task_id: Uuid, now: DateTime<Utc>) -> Result<SweepResult> {
        let _guard = self.locks.lock(task_id).await;
        let txn = self.db.pool.begin().await?;
        let task = Self::load_task(&txn, task_id).await?;
        let last_bid_at = AuctionBid::latest_created_at(&txn, task_id).await?;

        let result = match lifecycle::plan_sweep(&task, last_bid_at, now, &self.config) {
            SweepAction::Idle => return Ok(SweepResult::Idle),
            SweepAction::Extend { planned_end_at } => {
                let next = lifecycle::extend(&task, planned_end_at, now);
                let saved = Task::save_state(&txn, &next).await?;
                EventOutbox::enqueue(
                    &txn,
                    EVENT_AUCTION_EXTENDED,
                    TASK_ENTITY,
                    task_id,
                    &AuctionWindowPayload {
                        task_id,
                        planned_end_at,
                    },
                )
                .await?;
                info!(
                    task_id = %task_id,
                    %planned_end_at,
                    extensions = saved.auction_extension_count,
                    "auction extended"
                );
                SweepResult::Extended
            }
            SweepAction::Close => match self.close_in(&txn, &task, now).await? {
                CloseOutcome::AlreadyClosed => SweepResult::Idle,
                CloseOutcome::Closed { .. } => SweepResult::Closed,
            },
        };
        txn.commit().await?;
        Ok(result)
    }

    /// Closes the auction now, whatever its planned end. Closing twice is a no-op.
    pub async fn close_auction(&self, task_id: Uuid, now: DateTime<Utc>) -> Result<CloseOutcome> {
        let _guard = self.locks.lock(task_id).await;
        let txn = self.db.pool.begin().await?;
        let task = Self::load_task(&txn, task_id).await?;
        let outcome = self.close_in(&txn, &task, now).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    async fn close_in<C: ConnectionTrait>(
        &self,
        txn: &C,
        task: &Task,
        now: DateTime<Utc>,
    ) -> Result<CloseOutcome> {
        let CloseOutcome::Closed { task: next } = lifecycle::close(task, now)? else {
            return Ok(CloseOutcome::AlreadyClosed);
        };
        let saved = Task::save_state(txn, &next).await?;
        EventOutbox::enqueue(
            txn,
            EVENT_AUCTION_CLOSED,
            TASK_ENTITY,
            saved.id,
            &AuctionClosedPayload {
                task_id: saved.id,
                task_title: saved.title.clone(),
                winner_id: saved.auction_winner_id,
                closed_at: now,
            },
        )
        .await?;
        if saved.status != task.status {
            EventOutbox::enqueue(
                txn,
                EVENT_TASK_STATUS_CHANGED,
                TASK_ENTITY,
                saved.id,
                &TaskStatusChangedPayload {
                    task_id: saved.id,
                    from: task.status,
                    to: saved.status,
                },
            )
            .await?;
        }

        match saved.auction_winner_id {
            Some(winner_id) => info!(task_id = %saved.id, %winner_id, "auction closed"),
            None => info!(task_id = %saved.id, "auction closed without bids"),
        }
        Ok(CloseOutcome::Closed { task: saved })
    }

    /// Moves a task along the workflow. Open auctions only leave BACKLOG by closing.
    pub async fn transition_status(&self, task_id: Uuid, to: TaskStatus) -> Result<Task> {
        let _guard = self.locks.lock(task_id).await;
        let txn = self.db.pool.begin().await?;
        let task = Self::load_task(&txn, task_id).await?;

        if lifecycle::is_open(&task) {
            return Err(AuctionConflict::AuctionOpen.into());
        }
        lifecycle::check_transition(task.status, to)?;

        let mut next = task.clone();
        next.status = to;
        if to == TaskStatus::Backlog {
            next.assignee_id = None;
        }
        let saved = Task::save_state(&txn, &next).await?;
        EventOutbox::enqueue(
            &txn,
            EVENT_TASK_STATUS_CHANGED,
            TASK_ENTITY,
            task_id,
            &TaskStatusChangedPayload {
                task_id,
                from: task.status,
                to,
            },
        )
        .await?;
        txn.commit().await?;

        info!(task_id = %task_id, from = %task.status, to = %to, "task status changed");
        Ok(saved)
    }
}

fn seconds_remaining(task: &Task, now: DateTime<Utc>) -> Option<i64> {
    if task.auction_end_at.is_some() {
        return Some(0);
    }
    lifecycle::time_remaining(task, now).map(|remaining| remaining.num_seconds())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use db::{
        DbErr,
        events::EVENT_TASK_CREATED,
        models::{
            organization::{Department, Division},
            point_transaction::{CreatePointTransaction, PointTransaction},
            user::CreateUser,
        },
        types::{TaskType, UserRole},
    };

    use super::*;
    use crate::services::{eligibility::DenialReason, ratchet::BidValidationError};

    struct World {
        service: AuctionService,
        db: DBService,
        department: Uuid,
        division: Uuid,
        other_division: Uuid,
        creator: User,
    }

    impl World {
        async fn new() -> Self {
            let db = DBService::connect("sqlite::memory:").await.unwrap();
            let department = Department::create(&db.pool, Uuid::new_v4(), "Finance")
                .await
                .unwrap();
            let division = Division::create(&db.pool, Uuid::new_v4(), department.id, None, "AP")
                .await
                .unwrap();
            let other_division =
                Division::create(&db.pool, Uuid::new_v4(), department.id, None, "AR")
                    .await
                    .unwrap();

            let mut data = CreateUser::new("Creator", UserRole::Manager);
            data.department_id = Some(department.id);
            data.division_id = Some(division.id);
            let creator = User::create(&db.pool, &data, Uuid::new_v4()).await.unwrap();

            Self {
                service: AuctionService::new(db.clone(), AuctionConfig::default()),
                db,
                department: department.id,
                division: division.id,
                other_division: other_division.id,
                creator,
            }
        }

        async fn user(&self, name: &str, role: UserRole, grade: Option<Grade>) -> User {
            let mut data = CreateUser::new(name, role);
            data.department_id = Some(self.department);
            data.division_id = Some(self.division);
            data.grade = grade;
            User::create(&self.db.pool, &data, Uuid::new_v4())
                .await
                .unwrap()
        }

        fn task_data(&self, task_type: TaskType, mode: AuctionMode) -> CreateTask {
            CreateTask {
                title: "Reconcile ledgers".to_string(),
                description: Some("Month-end close".to_string()),
                task_type,
                mode,
                department_id: self.department,
                management_id: None,
                division_id: Some(self.division),
                minimum_grade: None,
                deadline: None,
                base_price: Money::from_units(900_000),
                base_time_minutes: Some(480),
            }
        }

        async fn money_auction(&self) -> Task {
            self.service
                .create_task(
                    self.creator.id,
                    self.task_data(TaskType::Department, AuctionMode::Money),
                )
                .await
                .unwrap()
        }
    }

    fn conflict<T: std::fmt::Debug>(result: Result<T>) -> AuctionConflict {
        match result {
            Err(AuctionError::Conflict(conflict)) => conflict,
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn creating_auctioned_task_opens_window() {
        let world = World::new().await;
        let task = world.money_auction().await;

        let start = task.auction_start_at.unwrap();
        assert_eq!(
            task.auction_planned_end_at,
            Some(start + TimeDelta::hours(24))
        );
        assert!(task.auction_end_at.is_none());
        assert!(lifecycle::is_open(&task));
        assert_eq!(task.version, 1);

        let events = EventOutbox::fetch_for_entity(&world.db.pool, task.id)
            .await
            .unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec![EVENT_TASK_CREATED, EVENT_AUCTION_OPENED]);
    }

    #[tokio::test]
    async fn individual_tasks_are_not_auctioned() {
        let world = World::new().await;
        let task = world
            .service
            .create_task(
                world.creator.id,
                world.task_data(TaskType::Individual, AuctionMode::Money),
            )
            .await
            .unwrap();
        assert!(task.auction_start_at.is_none());

        let bidder = world.user("Aziz", UserRole::Employee, None).await;
        let result = world
            .service
            .submit_bid(task.id, bidder.id, &BidSubmission::money(1_000_000_i64))
            .await;
        assert_eq!(conflict(result), AuctionConflict::NotAuctioned);
        assert_eq!(
            conflict(world.service.open_auction(task.id).await),
            AuctionConflict::NotAuctioned
        );
    }

    #[tokio::test]
    async fn create_task_validates_opening_value() {
        let world = World::new().await;
        let mut data = world.task_data(TaskType::Unit, AuctionMode::Time);
        data.base_time_minutes = None;
        let err = world
            .service
            .create_task(world.creator.id, data)
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::InvalidTask(msg) if msg.contains("base_time_minutes")));

        let err = world
            .service
            .create_task(
                Uuid::new_v4(),
                world.task_data(TaskType::Unit, AuctionMode::Money),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::UserNotFound));
    }

    #[tokio::test]
    async fn price_auction_scenario() {
        let world = World::new().await;
        let task = world.money_auction().await;
        let a = world.user("Bidder A", UserRole::Employee, None).await;
        let b = world.user("Bidder B", UserRole::Employee, None).await;
        let service = &world.service;

        let equal = service
            .submit_bid(task.id, a.id, &BidSubmission::money(900_000_i64))
            .await;
        assert_eq!(conflict(equal), AuctionConflict::NotImproved);

        let receipt = service
            .submit_bid(task.id, a.id, &BidSubmission::money("950 000"))
            .await
            .unwrap();
        assert_eq!(receipt.task.current_price, Money::from_units(950_000));
        assert_eq!(receipt.task.auction_leader_id, Some(a.id));
        assert_eq!(receipt.bid.bidder_grade, Grade::D);

        let tie = service
            .submit_bid(task.id, b.id, &BidSubmission::money(950_000_i64))
            .await;
        assert_eq!(conflict(tie), AuctionConflict::NotImproved);

        let receipt = service
            .submit_bid(task.id, b.id, &BidSubmission::money(1_000_000_i64))
            .await
            .unwrap();
        assert_eq!(receipt.task.current_price, Money::from_units(1_000_000));
        assert_eq!(receipt.task.auction_leader_id, Some(b.id));
        assert_eq!(receipt.task.auction_winner_id, None);

        let outcome = service
            .close_auction(task.id, Utc::now())
            .await
            .unwrap();
        let closed = outcome.task().unwrap();
        assert_eq!(closed.auction_winner_id, Some(b.id));
        assert_eq!(closed.auction_winner_name.as_deref(), Some("Bidder B"));
        assert_eq!(closed.assignee_id, Some(b.id));
        assert_eq!(closed.status, TaskStatus::InProgress);

        let history = service.bids(task.id).await.unwrap();
        let values: Vec<Option<Money>> = history.iter().map(|bid| bid.value_money).collect();
        assert_eq!(
            values,
            vec![Money::from_units(950_000), Money::from_units(1_000_000)]
        );

        let late = service
            .submit_bid(task.id, a.id, &BidSubmission::money(2_000_000_i64))
            .await;
        assert_eq!(conflict(late), AuctionConflict::AuctionClosed);
    }

    #[tokio::test]
    async fn rejections_carry_their_kind() {
        let world = World::new().await;
        let mut data = world.task_data(TaskType::Unit, AuctionMode::Time);
        data.minimum_grade = Some(Grade::B);
        let task = world
            .service
            .create_task(world.creator.id, data)
            .await
            .unwrap();

        let junior = world.user("Junior", UserRole::Employee, None).await;
        let err = world
            .service
            .submit_bid(task.id, junior.id, &BidSubmission::time(300_i64))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Denied(DenialReason::GradeTooLow {
                required: Grade::B,
                actual: Grade::D
            })
        ));

        let err = world
            .service
            .submit_bid(task.id, world.creator.id, &BidSubmission::time(300_i64))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Denied(DenialReason::CreatorCannotBid)
        ));

        let senior = world.user("Lead", UserRole::Employee, Some(Grade::A)).await;
        let err = world
            .service
            .submit_bid(task.id, senior.id, &BidSubmission::money(300_i64))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Validation(BidValidationError::WrongMode { .. })
        ));

        let err = world
            .service
            .submit_bid(task.id, Uuid::new_v4(), &BidSubmission::time(300_i64))
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::UserNotFound));

        let err = world
            .service
            .submit_bid(Uuid::new_v4(), senior.id, &BidSubmission::time(300_i64))
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::TaskNotFound));

        assert!(world.service.bids(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn points_grant_grade_when_none_is_recorded() {
        let world = World::new().await;
        let mut data = world.task_data(TaskType::Department, AuctionMode::Money);
        data.minimum_grade = Some(Grade::C);
        let task = world
            .service
            .create_task(world.creator.id, data)
            .await
            .unwrap();
        let user = world.user("Rising", UserRole::Employee, None).await;

        let eligibility = world
            .service
            .evaluate_bid_eligibility(task.id, user.id)
            .await
            .unwrap();
        assert!(!eligibility.allowed);

        PointTransaction::create(
            &world.db.pool,
            &CreatePointTransaction {
                user_id: user.id,
                amount: 60,
                transaction_type: "task_completed".to_string(),
                task_title: Some("Audit".to_string()),
                comment: None,
            },
        )
        .await
        .unwrap();

        let eligibility = world
            .service
            .evaluate_bid_eligibility(task.id, user.id)
            .await
            .unwrap();
        assert!(eligibility.allowed);
        assert_eq!(eligibility.user_grade, Some(Grade::C));

        let grade = world.service.user_grade(user.id).await.unwrap();
        assert_eq!(grade.source, GradeSource::Points);
        assert_eq!(
            grade.progress.and_then(|progress| progress.points_to_next),
            Some(15)
        );

        let manager = world.service.user_grade(world.creator.id).await.unwrap();
        assert_eq!(manager.source, GradeSource::Role);
        assert_eq!(manager.grade, Grade::B);
        assert!(manager.progress.is_none());

        let appointed = world.user("Appointed", UserRole::Employee, Some(Grade::A)).await;
        PointTransaction::create(
            &world.db.pool,
            &CreatePointTransaction {
                user_id: appointed.id,
                amount: 10,
                transaction_type: "task_completed".to_string(),
                task_title: None,
                comment: None,
            },
        )
        .await
        .unwrap();
        let appointed = world.service.user_grade(appointed.id).await.unwrap();
        assert_eq!(appointed.source, GradeSource::Explicit);
        assert_eq!(appointed.grade, Grade::A);
        assert!(appointed.progress.is_none());
    }

    #[tokio::test]
    async fn listing_respects_scope() {
        let world = World::new().await;
        let unit_task = world
            .service
            .create_task(
                world.creator.id,
                world.task_data(TaskType::Unit, AuctionMode::Money),
            )
            .await
            .unwrap();
        let department_task = world.money_auction().await;

        let mut data = CreateUser::new("Neighbour", UserRole::Employee);
        data.department_id = Some(world.department);
        data.division_id = Some(world.other_division);
        let neighbour = User::create(&world.db.pool, &data, Uuid::new_v4())
            .await
            .unwrap();

        let listing = world
            .service
            .list_auctions(neighbour.id, Utc::now())
            .await
            .unwrap();
        let ids: Vec<Uuid> = listing.iter().map(|entry| entry.task.id).collect();
        assert_eq!(ids, vec![department_task.id]);
        assert!(listing[0].eligibility.allowed);

        let visibility = world
            .service
            .evaluate_visibility(unit_task.id, neighbour.id)
            .await
            .unwrap();
        assert_eq!(visibility.reason, Some(DenialReason::OtherDivision));

        let admin = world.user("Root", UserRole::Admin, None).await;
        assert!(
            world
                .service
                .list_auctions(admin.id, Utc::now())
                .await
                .unwrap()
                .is_empty()
        );

        let creator_view = world
            .service
            .list_auctions(world.creator.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(creator_view.len(), 2);
        assert!(creator_view.iter().all(|entry| !entry.eligibility.allowed));
    }

    #[tokio::test]
    async fn sweep_extends_stalled_and_closes_due_auctions() {
        let world = World::new().await;
        let task = world.money_auction().await;
        let start = task.auction_start_at.unwrap();
        let planned = task.auction_planned_end_at.unwrap();
        let service = &world.service;

        let report = service
            .sweep_extensions_and_closes(start + TimeDelta::hours(1))
            .await
            .unwrap();
        assert_eq!(report.examined, 1);
        assert!(report.is_idle());

        let stalled = start + TimeDelta::hours(5);
        let report = service.sweep_extensions_and_closes(stalled).await.unwrap();
        assert_eq!(report.extended, vec![task.id]);

        // Running again at the same instant changes nothing.
        let report = service.sweep_extensions_and_closes(stalled).await.unwrap();
        assert!(report.is_idle());

        let extended = service.get_task(task.id, stalled).await.unwrap().task;
        assert_eq!(
            extended.auction_planned_end_at,
            Some(planned + TimeDelta::hours(4))
        );
        assert_eq!(extended.auction_extension_count, 1);

        let bidder = world.user("Closer", UserRole::Senior, None).await;
        service
            .submit_bid(task.id, bidder.id, &BidSubmission::money(1_200_000_i64))
            .await
            .unwrap();

        let due = planned + TimeDelta::hours(4);
        let report = service.sweep_extensions_and_closes(due).await.unwrap();
        assert_eq!(report.closed, vec![task.id]);
        assert!(report.failed.is_empty());
        assert_eq!(report.pruned_locks, 1);
        assert!(service.locks().is_empty());

        let closed = service.get_task(task.id, due).await.unwrap();
        assert_eq!(closed.task.auction_end_at, Some(due));
        assert_eq!(closed.task.auction_winner_id, Some(bidder.id));
        assert_eq!(closed.display_status, DisplayStatus::InProgress);
        assert_eq!(closed.seconds_remaining, Some(0));

        let report = service
            .sweep_extensions_and_closes(due + TimeDelta::hours(1))
            .await
            .unwrap();
        assert_eq!(report.examined, 0);
    }

    #[test]
    fn sweep_report_keeps_going_past_a_failed_task() {
        let (broken, raced, due) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut report = SweepReport {
            examined: 3,
            ..Default::default()
        };

        report.record(
            broken,
            Err(DbErr::Custom("disk I/O error".to_string()).into()),
        );
        report.record(raced, Err(AuctionConflict::StaleState.into()));
        report.record(due, Ok(SweepResult::Closed));

        assert_eq!(report.failed, vec![broken]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.closed, vec![due]);
        assert!(!report.is_idle());

        let mut only_failures = SweepReport::default();
        only_failures.record(broken, Err(AuctionError::TaskNotFound));
        assert!(!only_failures.is_idle());
    }

    #[tokio::test]
    async fn closing_twice_matches_closing_once() {
        let world = World::new().await;
        let task = world.money_auction().await;
        let now = Utc::now();

        let first = world.service.close_auction(task.id, now).await.unwrap();
        let after_first = world.service.get_task(task.id, now).await.unwrap().task;
        assert_eq!(first.task(), Some(&after_first));
        assert_eq!(after_first.status, TaskStatus::Backlog);
        assert_eq!(after_first.auction_winner_id, None);

        let second = world
            .service
            .close_auction(task.id, now + TimeDelta::hours(1))
            .await
            .unwrap();
        assert!(matches!(second, CloseOutcome::AlreadyClosed));
        let after_second = world.service.get_task(task.id, now).await.unwrap().task;
        assert_eq!(after_first, after_second);

        let closed_events = EventOutbox::fetch_for_entity(&world.db.pool, task.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|event| event.event_type == EVENT_AUCTION_CLOSED)
            .count();
        assert_eq!(closed_events, 1);
    }

    #[tokio::test]
    async fn status_moves_follow_allow_list() {
        let world = World::new().await;
        let task = world.money_auction().await;
        let service = &world.service;

        assert_eq!(
            conflict(service.transition_status(task.id, TaskStatus::InProgress).await),
            AuctionConflict::AuctionOpen
        );

        let bidder = world.user("Worker", UserRole::Employee, None).await;
        service
            .submit_bid(task.id, bidder.id, &BidSubmission::money(999_999_i64))
            .await
            .unwrap();
        service.close_auction(task.id, Utc::now()).await.unwrap();

        assert_eq!(
            conflict(service.transition_status(task.id, TaskStatus::Done).await),
            AuctionConflict::InvalidTransition {
                from: TaskStatus::InProgress,
                to: TaskStatus::Done
            }
        );
        let review = service
            .transition_status(task.id, TaskStatus::UnderReview)
            .await
            .unwrap();
        assert_eq!(review.status, TaskStatus::UnderReview);
        let rework = service
            .transition_status(task.id, TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(rework.assignee_id, Some(bidder.id));
        let withdrawn = service
            .transition_status(task.id, TaskStatus::Backlog)
            .await
            .unwrap();
        assert_eq!(withdrawn.assignee_id, None);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let world = World::new().await;
        let task = world.money_auction().await;
        let bidder = world.user("Racer", UserRole::Employee, None).await;
        world
            .service
            .submit_bid(task.id, bidder.id, &BidSubmission::money(950_000_i64))
            .await
            .unwrap();

        // `task` predates the bid, as a second process would see it.
        let err = Task::save_state(&world.db.pool, &task).await.unwrap_err();
        assert!(matches!(
            AuctionError::from(err),
            AuctionError::Conflict(AuctionConflict::StaleState)
        ));
    }

    #[tokio::test]
    async fn concurrent_bids_serialize_per_task() {
        let world = World::new().await;
        let task = world.money_auction().await;

        let mut bidders = Vec::new();
        for idx in 0..8 {
            bidders.push(
                world
                    .user(&format!("Bidder {idx}"), UserRole::Employee, None)
                    .await,
            );
        }

        // Every bidder offers the same ladder in a different order.
        let mut handles = Vec::new();
        for (idx, bidder) in bidders.iter().enumerate() {
            let service = world.service.clone();
            let bidder_id = bidder.id;
            let task_id = task.id;
            let amount = 910_000 + ((idx * 5) % 8) as i64 * 10_000;
            handles.push(tokio::spawn(async move {
                let result = service
                    .submit_bid(task_id, bidder_id, &BidSubmission::money(amount))
                    .await;
                (bidder_id, amount, result)
            }));
        }

        let mut accepted = 0;
        let mut top = (Uuid::nil(), 0);
        for outcome in futures::future::join_all(handles).await {
            let (bidder_id, amount, result) = outcome.unwrap();
            match result {
                Ok(_) => accepted += 1,
                Err(AuctionError::Conflict(AuctionConflict::NotImproved)) => {}
                Err(err) => panic!("unexpected error: {err:?}"),
            }
            if amount > top.1 {
                top = (bidder_id, amount);
            }
        }

        let history = world.service.bids(task.id).await.unwrap();
        assert_eq!(history.len(), accepted);
        let values: Vec<Money> = history.iter().filter_map(|bid| bid.value_money).collect();
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));

        let stored = world.service.get_task(task.id, Utc::now()).await.unwrap().task;
        assert_eq!(stored.current_price, Money::from_units(top.1));
        assert_eq!(stored.auction_leader_id, Some(top.0));
        assert_eq!(stored.version, 1 + accepted as i64);
    }
}
