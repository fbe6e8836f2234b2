mod appchain;
mod indexer;
mod node;
mod reward;
mod session;
mod validator;

pub use appchain::{
    AnchorStatus, AppchainInfo, AppchainInfoWithAnchorStatus, AppchainMetadata, AppchainSettings,
    AppchainState, FungibleTokenMetadata, IndexRange, PermissionlessActionsStatus,
    ProtocolSettings, UserVotes, ValidatorSetInfo, WrappedAppchainToken,
};
pub use indexer::{ActionReceiptAction, ExplorerQuery};
pub use node::{CloudVendor, Node, NodeAction, NodeBoard, NodeInstance, NodeState, NodeTask};
pub use reward::RewardHistory;
pub use session::{ExplorerCredentials, NetworkConfig, Session};
pub use validator::{
    is_active_validator, is_delegated_by, needs_session_keys, Delegator, Validator,
    ValidatorDisplayState,
};

#[cfg(test)]
pub(crate) use session::test_network;
#[cfg(test)]
pub(crate) use validator::test_validator;
