/// projects the pool record a single action leaves behind
use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collateral::{
    collateral_ratio, liquidate_batch, repay_batch, CompensationPolicy, LiquidationOutcome,
    LiquidationPricing, RepaymentOutcome, SettlementTotals,
};
use crate::config::PoolConfig;
use crate::decimal::Ppm;
use crate::effects::{Effect, EffectLog, Flow, Role};
use crate::errors::{LendingError, Result};
use crate::interest::{interest_rate, utilization};
use crate::liquidity::{self, ShareQuote};
use crate::math::{checked_add, checked_sub};
use crate::oracle::{asset_amount_for_value, value_or_raw, Direction, PriceFeed};
use crate::types::{AssetId, LoanId, LoanPosition, LoanStatus, PoolSnapshot};

/// how a withdrawal is sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawRequest {
    /// burn exactly this many shares
    Shares(u64),
    /// take out at most this amount
    Amount(u64),
}

/// action applied to a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolAction {
    Deposit {
        amount: u64,
        /// defaults to `amount`
        max_shares: Option<u64>,
    },
    Withdraw(WithdrawRequest),
    Borrow {
        loan_id: LoanId,
        amount: u64,
        collateral_amount: u64,
    },
    Repay {
        loans: Vec<LoanPosition>,
    },
    Liquidate {
        loans: Vec<LoanPosition>,
    },
    /// staking rewards, in the native currency, swept into the pool
    AdjustFee {
        rewards_amount: u64,
    },
}

impl PoolAction {
    pub fn name(&self) -> &'static str {
        match self {
            PoolAction::Deposit { .. } => "deposit",
            PoolAction::Withdraw(_) => "withdraw",
            PoolAction::Borrow { .. } => "borrow",
            PoolAction::Repay { .. } => "repay",
            PoolAction::Liquidate { .. } => "liquidate",
            PoolAction::AdjustFee { .. } => "adjust fee",
        }
    }
}

/// time, prices and caller policy an action is evaluated under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionContext {
    pub now: DateTime<Utc>,
    /// prices the pool's loan asset; not needed for a native loan asset
    pub loan_feed: Option<PriceFeed>,
    /// prices the pool's collateral asset; not needed for native collateral
    pub collateral_feed: Option<PriceFeed>,
    pub compensation_policy: CompensationPolicy,
}

impl ProjectionContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            loan_feed: None,
            collateral_feed: None,
            compensation_policy: CompensationPolicy::default(),
        }
    }

    /// read `now` once from the provider
    pub fn from_time_provider(time_provider: &SafeTimeProvider) -> Self {
        Self::at(time_provider.now())
    }

    pub fn with_loan_feed(mut self, feed: PriceFeed) -> Self {
        self.loan_feed = Some(feed);
        self
    }

    pub fn with_collateral_feed(mut self, feed: PriceFeed) -> Self {
        self.collateral_feed = Some(feed);
        self
    }

    pub fn with_compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.compensation_policy = policy;
        self
    }

    fn pricing(&self) -> LiquidationPricing<'_> {
        LiquidationPricing {
            loan_feed: self.loan_feed.as_ref(),
            collateral_feed: self.collateral_feed.as_ref(),
            policy: self.compensation_policy,
            now: self.now,
        }
    }
}

/// per-action figures behind a projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionDetail {
    Deposit(ShareQuote),
    Withdraw(ShareQuote),
    Borrow {
        utilization_rate: Ppm,
    },
    Repay(Vec<RepaymentOutcome>),
    Liquidate(Vec<LiquidationOutcome>),
    AdjustFee {
        /// rewards expressed in the pool's loan asset
        converted_amount: u64,
    },
}

/// pool state after an action and what it takes to get there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub next: PoolSnapshot,
    pub effects: Vec<Effect>,
    /// loans opened or closed by the action
    pub loans: Vec<LoanPosition>,
    pub detail: ActionDetail,
}

/// apply any action
pub fn project(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    action: &PoolAction,
    context: &ProjectionContext,
) -> Result<Projection> {
    let projection = match action {
        PoolAction::Deposit { amount, max_shares } => deposit(snapshot, config, *amount, *max_shares),
        PoolAction::Withdraw(request) => withdraw(snapshot, config, *request),
        PoolAction::Borrow {
            loan_id,
            amount,
            collateral_amount,
        } => borrow(snapshot, config, *loan_id, *amount, *collateral_amount, context),
        PoolAction::Repay { loans } => repay(snapshot, config, loans, context),
        PoolAction::Liquidate { loans } => liquidate(snapshot, config, loans, context),
        PoolAction::AdjustFee { rewards_amount } => sweep_fees(snapshot, config, *rewards_amount, context),
    }?;

    debug!(
        action = action.name(),
        balance = projection.next.balance,
        lent_out = projection.next.lent_out,
        total_shares = projection.next.total_shares,
        effects = projection.effects.len(),
        "projected pool action"
    );

    Ok(projection)
}

fn check_inputs(snapshot: &PoolSnapshot, config: &PoolConfig) -> Result<()> {
    snapshot.validate()?;
    config.validate()
}

fn ensure_asset(expected: &AssetId, found: &AssetId) -> Result<()> {
    if expected != found {
        return Err(LendingError::AssetMismatch {
            expected: expected.clone(),
            found: found.clone(),
        });
    }
    Ok(())
}

fn add_pool_fee(balance: u64, config: &PoolConfig) -> Result<u64> {
    checked_add(balance, config.pool_fee, "pool fee")
}

fn emit_pool_fee(log: &mut EffectLog, snapshot: &PoolSnapshot, config: &PoolConfig) {
    log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &snapshot.asset, config.pool_fee));
}

/// add liquidity and mint shares
pub fn deposit(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    amount: u64,
    max_shares: Option<u64>,
) -> Result<Projection> {
    check_inputs(snapshot, config)?;
    let quote = liquidity::deposit(snapshot, amount, max_shares, config.min_transition)?;

    let mut next = snapshot.clone();
    next.balance = add_pool_fee(checked_add(snapshot.balance, quote.amount, "deposit")?, config)?;
    next.total_shares = checked_add(snapshot.total_shares, quote.shares, "deposit shares")?;

    let mut log = EffectLog::new();
    log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &snapshot.asset, quote.amount));
    emit_pool_fee(&mut log, snapshot, config);
    log.emit(Effect::shares(Role::Depositor, Flow::Minted, quote.shares));

    debug!(amount, accepted = quote.amount, shares = quote.shares, "deposit");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: Vec::new(),
        detail: ActionDetail::Deposit(quote),
    })
}

/// burn shares and pay out liquidity
pub fn withdraw(snapshot: &PoolSnapshot, config: &PoolConfig, request: WithdrawRequest) -> Result<Projection> {
    check_inputs(snapshot, config)?;
    let quote = match request {
        WithdrawRequest::Shares(shares) => liquidity::withdraw_shares(snapshot, shares, config.min_transition)?,
        WithdrawRequest::Amount(amount) => liquidity::withdraw_amount(snapshot, amount, config.min_transition)?,
    };

    let mut next = snapshot.clone();
    next.balance = add_pool_fee(checked_sub(snapshot.balance, quote.amount, "withdrawal")?, config)?;
    next.total_shares = checked_sub(snapshot.total_shares, quote.shares, "withdrawal shares")?;

    let mut log = EffectLog::new();
    log.emit(Effect::asset(Role::Depositor, Flow::OutOfPool, &snapshot.asset, quote.amount));
    log.emit(Effect::shares(Role::Depositor, Flow::Burned, quote.shares));
    emit_pool_fee(&mut log, snapshot, config);

    debug!(amount = quote.amount, shares = quote.shares, "withdraw");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: Vec::new(),
        detail: ActionDetail::Withdraw(quote),
    })
}

/// open a loan against posted collateral
pub fn borrow(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    loan_id: LoanId,
    amount: u64,
    collateral_amount: u64,
    context: &ProjectionContext,
) -> Result<Projection> {
    check_inputs(snapshot, config)?;

    if amount < config.min_loan {
        return Err(LendingError::BelowMinimumLoan {
            minimum: config.min_loan,
            requested: amount,
        });
    }
    if amount > snapshot.balance {
        return Err(LendingError::InsufficientPoolBalance {
            available: snapshot.balance,
            requested: amount,
        });
    }

    let now = context.now;
    let loan_value = value_or_raw(context.loan_feed.as_ref(), &snapshot.asset, amount, Direction::Buying, now)?;
    let collateral_value = value_or_raw(
        context.collateral_feed.as_ref(),
        &snapshot.collateral_asset,
        collateral_amount,
        Direction::Selling,
        now,
    )?;
    let ratio = collateral_ratio(collateral_value, loan_value)?;
    if ratio < config.initial_collateral_ratio {
        return Err(LendingError::InsufficientCollateral {
            ratio,
            required: config.initial_collateral_ratio,
        });
    }

    let mut next = snapshot.clone();
    next.balance = add_pool_fee(snapshot.balance - amount, config)?;
    next.lent_out = checked_add(snapshot.lent_out, amount, "lent out")?;

    // the validator prices the loan against the updated pool
    let utilization_rate = utilization(&next, amount)?;
    let rate = interest_rate(&config.interest, amount, &next)?;

    let loan = LoanPosition {
        id: loan_id,
        principal: amount,
        interest_rate: rate,
        origination_time: now,
        collateral_amount,
        collateral_asset: snapshot.collateral_asset.clone(),
        loan_asset: snapshot.asset.clone(),
        status: LoanStatus::Active,
        terms: config.liquidation_terms(),
        pool_balance_at_origination: snapshot.balance,
        pool_lent_out_at_origination: snapshot.lent_out,
    };

    let mut log = EffectLog::new();
    log.emit(Effect::asset(Role::Borrower, Flow::OutOfPool, &snapshot.asset, amount).for_loan(loan_id));
    log.emit(
        Effect::asset(Role::Borrower, Flow::Locked, &snapshot.collateral_asset, collateral_amount).for_loan(loan_id),
    );
    emit_pool_fee(&mut log, snapshot, config);

    debug!(loan_id = %loan_id, amount, collateral_amount, rate = %rate, "borrow");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: vec![loan],
        detail: ActionDetail::Borrow { utilization_rate },
    })
}

fn ensure_batch(snapshot: &PoolSnapshot, loans: &[LoanPosition]) -> Result<()> {
    if loans.is_empty() {
        return Err(LendingError::InconsistentSnapshot {
            message: "no loans to settle".to_string(),
        });
    }
    for loan in loans {
        ensure_asset(&snapshot.asset, &loan.loan_asset)?;
        ensure_asset(&snapshot.collateral_asset, &loan.collateral_asset)?;
    }
    Ok(())
}

fn settle(snapshot: &PoolSnapshot, config: &PoolConfig, totals: &SettlementTotals) -> Result<PoolSnapshot> {
    let lent_out = snapshot
        .lent_out
        .checked_sub(totals.principal)
        .ok_or_else(|| LendingError::InconsistentSnapshot {
            message: format!(
                "settling {} of principal against {} lent out",
                totals.principal, snapshot.lent_out
            ),
        })?;

    let mut next = snapshot.clone();
    next.balance = add_pool_fee(checked_add(snapshot.balance, totals.debt, "settlement")?, config)?;
    next.lent_out = lent_out;
    Ok(next)
}

fn closed(loans: &[LoanPosition], status: LoanStatus) -> Vec<LoanPosition> {
    let mut closed: Vec<LoanPosition> = loans.iter().map(|loan| loan.closed(status)).collect();
    closed.sort_by_key(|loan| loan.id);
    closed
}

/// close loans repaid by their borrowers
pub fn repay(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    loans: &[LoanPosition],
    context: &ProjectionContext,
) -> Result<Projection> {
    check_inputs(snapshot, config)?;
    ensure_batch(snapshot, loans)?;

    let (outcomes, totals) = repay_batch(loans, config, context.now)?;
    let next = settle(snapshot, config, &totals)?;

    let mut log = EffectLog::new();
    for outcome in &outcomes {
        let id = outcome.loan_id;
        log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &snapshot.asset, outcome.debt_amount).for_loan(id));
        log.emit(
            Effect::asset(Role::PlatformFeeCollector, Flow::PaidByCaller, &snapshot.asset, outcome.platform_fee)
                .for_loan(id),
        );
        log.emit(
            Effect::asset(Role::Borrower, Flow::Released, &snapshot.collateral_asset, outcome.collateral_released)
                .for_loan(id),
        );
    }
    emit_pool_fee(&mut log, snapshot, config);

    debug!(loans = outcomes.len(), principal = totals.principal, debt = totals.debt, "repay");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: closed(loans, LoanStatus::Repaid),
        detail: ActionDetail::Repay(outcomes),
    })
}

/// close undercollateralized loans
pub fn liquidate(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    loans: &[LoanPosition],
    context: &ProjectionContext,
) -> Result<Projection> {
    check_inputs(snapshot, config)?;
    ensure_batch(snapshot, loans)?;

    let (outcomes, totals) = liquidate_batch(loans, config, &context.pricing())?;
    let next = settle(snapshot, config, &totals)?;

    let mut log = EffectLog::new();
    for outcome in &outcomes {
        let id = outcome.loan_id;
        let collateral = &snapshot.collateral_asset;
        log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &snapshot.asset, outcome.debt_amount).for_loan(id));
        log.emit(
            Effect::asset(Role::PlatformFeeCollector, Flow::PaidByCaller, &snapshot.asset, outcome.platform_fee)
                .for_loan(id),
        );
        log.emit(Effect::asset(Role::Liquidator, Flow::Released, collateral, outcome.liquidator_collateral).for_loan(id));
        log.emit(Effect::asset(Role::Borrower, Flow::Released, collateral, outcome.borrower_compensation).for_loan(id));
        log.emit(Effect::asset(Role::LeftoverClaim, Flow::Released, collateral, outcome.protocol_claim).for_loan(id));
    }
    emit_pool_fee(&mut log, snapshot, config);

    debug!(loans = outcomes.len(), principal = totals.principal, debt = totals.debt, "liquidate");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: closed(loans, LoanStatus::Liquidated),
        detail: ActionDetail::Liquidate(outcomes),
    })
}

/// sweep staking rewards into the pool balance
///
/// Rewards accrue in the native currency; a pool lending another asset
/// receives what selling them into the loan feed returns. No pool fee is
/// charged.
pub fn sweep_fees(
    snapshot: &PoolSnapshot,
    config: &PoolConfig,
    rewards_amount: u64,
    context: &ProjectionContext,
) -> Result<Projection> {
    check_inputs(snapshot, config)?;

    let converted_amount = if snapshot.asset.is_native() {
        rewards_amount
    } else {
        let feed = context
            .loan_feed
            .as_ref()
            .ok_or_else(|| LendingError::AssetNotInFeed {
                asset: snapshot.asset.clone(),
            })?;
        asset_amount_for_value(feed, &snapshot.asset, rewards_amount, context.now)?
    };

    let mut next = snapshot.clone();
    next.balance = checked_add(snapshot.balance, converted_amount, "fee sweep")?;

    let mut log = EffectLog::new();
    log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &snapshot.asset, converted_amount));

    debug!(rewards_amount, converted_amount, "sweep fees");

    Ok(Projection {
        next,
        effects: log.into_effects(),
        loans: Vec::new(),
        detail: ActionDetail::AdjustFee { converted_amount },
    })
}
