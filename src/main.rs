use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Number;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use octopus_dashboard::config::Config;
use octopus_dashboard::contract_calls::{self, Pool, ValidatorProfile, VoteType, OCT_TOKEN_DECIMALS};
use octopus_dashboard::error::ConfigError;
use octopus_dashboard::models::{Node, NodeBoard, Session};
use octopus_dashboard::services::api::{
    withdraw_recorded_vote_deposit, DashboardApi, HttpDashboardApi,
};
use octopus_dashboard::services::delegation::{
    collect_delegation_events, get_delegated_validators, get_unbonded_validators,
    DelegationLedger,
};
use octopus_dashboard::services::explorer::ExplorerClient;
use octopus_dashboard::services::near_rpc::{self, AnchorContract};
use octopus_dashboard::services::node_deploy::destroy_node;
use octopus_dashboard::services::rewards::{
    calc_total_reward, calc_unwithdrawn_reward, can_claim, get_appchain_rewards,
};
use octopus_dashboard::services::staking_limits::{stake_bounds, StakeDirection};
use octopus_dashboard::views::{appchain_overview, validator_rows, SessionMembership};
use octopus_dashboard::{DashboardError, TokenAmount};

#[derive(Parser)]
#[command(name = "octopus-dashboard", about = "Octopus Network appchain dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewards of an account on an appchain, as validator and as delegator
    Rewards {
        #[arg(long)]
        appchain: String,
        #[arg(long)]
        account: String,
        /// Whether the anchor currently pauses reward withdrawals
        #[arg(long)]
        withdrawals_paused: bool,
    },
    /// Validators a delegator registered with or redelegated between
    Delegations {
        #[arg(long)]
        appchain: String,
        #[arg(long)]
        account: String,
    },
    /// Validators that unbonded their stake
    Unbonded {
        #[arg(long)]
        appchain: String,
    },
    /// Validator table of an appchain
    Validators {
        #[arg(long)]
        appchain: String,
        #[arg(long)]
        account: Option<String>,
        /// Validators listed in the appchain's current session
        #[arg(long, value_delimiter = ',')]
        in_session: Vec<String>,
        /// Validators whose next session keys are set
        #[arg(long, value_delimiter = ',')]
        with_keys: Vec<String>,
    },
    /// Appchain settings, era reward and wrapped token
    Appchain {
        #[arg(long)]
        appchain: String,
    },
    /// Amount range for changing a stake or delegation
    StakeBounds {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        validator: String,
        #[arg(long, value_enum)]
        direction: Direction,
        /// Currently deposited OCT
        #[arg(long)]
        deposited: String,
        /// OCT balance of the account
        #[arg(long, default_value = "0")]
        balance: String,
    },
    /// Ask the dashboard API to refresh its appchain cache
    Refresh,
    /// Destroy a deployed validator node
    NodeDestroy {
        /// JSON file with the node as returned by the deploy API
        #[arg(long)]
        node: String,
        #[arg(long)]
        secret_key: Option<String>,
    },
    /// Print a wallet transaction payload
    Tx {
        #[command(subcommand)]
        call: TxCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Increase,
    Decrease,
}

impl From<Direction> for StakeDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Increase => StakeDirection::Increase,
            Direction::Decrease => StakeDirection::Decrease,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Vote {
    Upvote,
    Downvote,
}

#[derive(Subcommand)]
enum TxCommand {
    IncreaseStake {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        amount: String,
    },
    DecreaseStake {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        amount: String,
    },
    RegisterValidator {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        validator_id_in_appchain: String,
        #[arg(long)]
        can_be_delegated_to: bool,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        social_media_handle: Option<String>,
    },
    RegisterDelegator {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        validator: String,
        #[arg(long)]
        amount: String,
    },
    IncreaseDelegation {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        validator: String,
        #[arg(long)]
        amount: String,
    },
    DecreaseDelegation {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        validator: String,
        #[arg(long)]
        amount: String,
    },
    ChangeDelegatedValidator {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    UnbondStake {
        #[arg(long)]
        anchor: String,
    },
    UnbondDelegation {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        validator: String,
    },
    ClaimRewards {
        #[arg(long)]
        anchor: String,
        #[arg(long)]
        account: String,
        /// Claim as delegator of this validator
        #[arg(long)]
        validator: Option<String>,
    },
    WithdrawVoteDeposit {
        #[arg(long)]
        appchain: String,
        /// Voter whose recorded deposit is withdrawn
        #[arg(long)]
        account: String,
        #[arg(long, value_enum)]
        vote: Vote,
        /// Raw amount; defaults to the account's recorded deposit
        #[arg(long)]
        amount: Option<String>,
    },
    CreatePool {
        #[arg(long)]
        in_token: String,
        #[arg(long)]
        out_token: String,
        #[arg(long)]
        in_token_rate: Number,
        #[arg(long)]
        out_token_rate: Number,
        #[arg(long)]
        reversible: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DashboardError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn oct(amount: &str) -> Result<TokenAmount, DashboardError> {
    Ok(TokenAmount::from_human(amount, OCT_TOKEN_DECIMALS)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = reqwest::Client::new();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            ctrl_c.cancel();
        }
    });

    if let Err(e) = run(cli.command, &config, client, &cancel).await {
        error!("{} ({:?})", e, e.kind());
        return Err(e.into());
    }
    Ok(())
}

async fn run(
    command: Command,
    config: &Config,
    client: reqwest::Client,
    cancel: &CancellationToken,
) -> Result<(), DashboardError> {
    let api = HttpDashboardApi::new(client.clone(), &config.network.api_host);
    let index = ExplorerClient::new(client.clone(), config.network.clone());

    match command {
        Command::Rewards {
            appchain,
            account,
            withdrawals_paused,
        } => {
            let session = Session::new(account, config.network.clone());
            let rewards = get_appchain_rewards(
                &api,
                &index,
                &session,
                &appchain,
                config.parallel_limit,
                cancel,
            )
            .await?;
            for (source, failure) in rewards.failures() {
                warn!("{} unavailable: {}", source, failure.message);
            }

            let decimals = rewards.appchain.info.token_decimals();
            let validator_rewards = rewards.validator_rewards_or_empty();
            println!(
                "{} at era {}: unwithdrawn {}, claimable {}",
                rewards.appchain.info.appchain_id,
                rewards.era_index,
                rewards.unwithdrawn_total().beautify(),
                can_claim(validator_rewards, decimals, withdrawals_paused),
            );
            println!(
                "  as validator: total {}, unwithdrawn {}",
                calc_total_reward(validator_rewards, decimals).beautify(),
                calc_unwithdrawn_reward(validator_rewards, decimals).beautify(),
            );
            for validator_id in rewards.delegator_rewards.keys() {
                let history = rewards.delegator_rewards_or_empty(validator_id);
                println!(
                    "  delegating to {}: total {}, unwithdrawn {}, claimable {}",
                    validator_id,
                    calc_total_reward(history, decimals).beautify(),
                    calc_unwithdrawn_reward(history, decimals).beautify(),
                    can_claim(history, decimals, withdrawals_paused),
                );
            }
        }
        Command::Delegations { appchain, account } => {
            let info = api.get_appchain(&appchain).await?.info;
            let anchor = info.appchain_anchor.as_str();
            let discovered =
                get_delegated_validators(&index, &config.network, anchor, &account).await;
            if !discovered.is_complete() {
                warn!("Delegation history of {} is incomplete", account);
            }
            let events = collect_delegation_events(&index, &config.network, anchor, &account).await?;
            let ledger = DelegationLedger::fold(events);
            for validator_id in &discovered.validator_ids {
                let current = if ledger.validator_ids.contains(validator_id) {
                    "current"
                } else {
                    "former"
                };
                println!("{} ({})", validator_id, current);
            }
        }
        Command::Unbonded { appchain } => {
            let info = api.get_appchain(&appchain).await?.info;
            for validator_id in get_unbonded_validators(&index, &info.appchain_anchor).await? {
                println!("{}", validator_id);
            }
        }
        Command::Validators {
            appchain,
            account,
            in_session,
            with_keys,
        } => {
            let appchain = api.get_appchain(&appchain).await?;
            let membership = SessionMembership {
                in_session,
                with_keys,
            };
            let rows = validator_rows(
                &api,
                &appchain,
                account.as_deref(),
                &membership,
                config.parallel_limit,
            )
            .await?;

            for row in rows {
                println!(
                    "{:<40} {:<11} stake {:>16} deposit {:>16} delegators {:>4} rewards {:>12} {}",
                    row.validator_id,
                    row.state.label(),
                    row.total_stake,
                    row.deposit_amount,
                    row.delegators_count,
                    row.total_rewards.as_deref().unwrap_or("-"),
                    row.hint().unwrap_or(""),
                );
            }
        }
        Command::Appchain { appchain } => {
            let appchain = api.get_appchain(&appchain).await?;
            let clients = Arc::new(near_rpc::create_near_connections(
                &config.primary_rpc,
                &config.secondary_rpc,
            ));
            let anchor = AnchorContract::new(clients, appchain.info.appchain_anchor.clone());
            let overview = appchain_overview(&api, &anchor, appchain).await;
            let info = &overview.appchain.info;
            println!(
                "{} ({:?}) anchor {}",
                info.appchain_id, info.appchain_state, info.appchain_anchor
            );
            if let Some(go_live) = info.go_live_at() {
                println!("  live since {}", go_live.to_rfc3339());
            }
            match overview.era_reward() {
                Some(reward) => println!("  era reward {}", reward.beautify()),
                None => println!("  era reward unknown"),
            }
            match &overview.wrapped_token {
                Ok(token) => println!(
                    "  wrapped token {} ({}, {} decimals) at {}",
                    token.metadata.name,
                    token.metadata.symbol,
                    token.metadata.decimals,
                    token.contract_account
                ),
                Err(failure) => warn!("Wrapped token unavailable: {}", failure.message),
            }
        }
        Command::StakeBounds {
            anchor,
            validator,
            direction,
            deposited,
            balance,
        } => {
            let clients = Arc::new(near_rpc::create_near_connections(
                &config.primary_rpc,
                &config.secondary_rpc,
            ));
            let anchor = AnchorContract::new(clients, anchor);
            info!("Reading stake limits from {}", anchor.contract_id());
            let bounds = stake_bounds(
                &anchor,
                &validator,
                direction.into(),
                &oct(&deposited)?,
                &oct(&balance)?,
            )
            .await?;
            print_json(&bounds)?;
            if !bounds.can_adjust() {
                println!("Stake of {} cannot be changed in this direction", validator);
            }
        }
        Command::Refresh => {
            api.update_appchains().await?;
            info!("Appchain cache refreshed");
        }
        Command::NodeDestroy { node, secret_key } => {
            let deploy_api_host = config
                .deploy_api_host
                .as_deref()
                .ok_or(ConfigError::Missing("DEPLOY_API_HOST"))?;
            let raw = tokio::fs::read_to_string(&node).await?;
            let node: Node = serde_json::from_str(&raw)?;
            let board = NodeBoard::for_node(&node);
            info!("Node {} is {}", node.uuid, board.label);
            destroy_node(&client, deploy_api_host, &node, secret_key.as_deref()).await?;
            println!("Destroy requested for {}", node.uuid);
        }
        Command::Tx { call } => print_json(&build_transaction(call, config, &api).await?)?,
    }
    Ok(())
}

async fn build_transaction(
    call: TxCommand,
    config: &Config,
    api: &dyn DashboardApi,
) -> Result<contract_calls::Transaction, DashboardError> {
    let oct_token = config.network.oct_token_contract_id.as_str();
    let tx = match call {
        TxCommand::IncreaseStake { anchor, amount } => {
            contract_calls::increase_stake(oct_token, &anchor, &oct(&amount)?)
        }
        TxCommand::DecreaseStake { anchor, amount } => {
            contract_calls::decrease_stake(&anchor, &oct(&amount)?)
        }
        TxCommand::RegisterValidator {
            anchor,
            amount,
            validator_id_in_appchain,
            can_be_delegated_to,
            email,
            social_media_handle,
        } => contract_calls::register_validator(
            oct_token,
            &anchor,
            &oct(&amount)?,
            &validator_id_in_appchain,
            can_be_delegated_to,
            &ValidatorProfile {
                email,
                social_media_handle,
            },
        ),
        TxCommand::RegisterDelegator {
            anchor,
            validator,
            amount,
        } => contract_calls::register_delegator(oct_token, &anchor, &validator, &oct(&amount)?),
        TxCommand::IncreaseDelegation {
            anchor,
            validator,
            amount,
        } => contract_calls::increase_delegation(oct_token, &anchor, &validator, &oct(&amount)?),
        TxCommand::DecreaseDelegation {
            anchor,
            validator,
            amount,
        } => contract_calls::decrease_delegation(&anchor, &validator, &oct(&amount)?),
        TxCommand::ChangeDelegatedValidator { anchor, from, to } => {
            contract_calls::change_delegated_validator(&anchor, &from, &to)
        }
        TxCommand::UnbondStake { anchor } => contract_calls::unbond_stake(&anchor),
        TxCommand::UnbondDelegation { anchor, validator } => {
            contract_calls::unbond_delegation(&anchor, &validator)
        }
        TxCommand::ClaimRewards {
            anchor,
            account,
            validator,
        } => contract_calls::claim_rewards(&anchor, &account, validator.as_deref()),
        TxCommand::WithdrawVoteDeposit {
            appchain,
            account,
            vote,
            amount,
        } => {
            let vote_type = match vote {
                Vote::Upvote => VoteType::Upvote,
                Vote::Downvote => VoteType::Downvote,
            };
            let registry = config.network.registry_contract_id.as_str();
            match amount {
                Some(amount) => {
                    contract_calls::withdraw_vote_deposit(registry, &appchain, vote_type, &amount)
                }
                None => {
                    withdraw_recorded_vote_deposit(api, registry, &account, &appchain, vote_type)
                        .await?
                }
            }
        }
        TxCommand::CreatePool {
            in_token,
            out_token,
            in_token_rate,
            out_token_rate,
            reversible,
        } => contract_calls::create_pool(
            &config.network.convertor_contract_id,
            &Pool {
                in_token,
                out_token,
                in_token_rate,
                out_token_rate,
                is_reversible: reversible,
            },
        ),
    };
    Ok(tx)
}
