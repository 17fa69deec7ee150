//! Native contracts: fungible/non-fungible tokens, the account-name
//! directory, the staking/fuel contract, and the gas contract (spec.md
//! §4.4). Each is a [`vela_runtime::NativeContract`] resolved through a
//! [`vela_runtime::ContractRegistry`] at its symbolic deployment address.

mod account;
mod error;
pub mod escrow;
mod gas;
mod staking;
mod token;

pub use account::{lookup_address, lookup_name, register, AccountContract};
pub use error::{ContractError, ContractResult};
pub use escrow::{EscrowNft, EscrowRecord};
pub use gas::GasContract;
pub use staking::{StakingContract, ENERGY_RATIO_DIVISOR, FUEL_TOKEN, STAKING_TOKEN};
pub use token::{
    all_balances, burn, burn_nft, create, credit, debit, get_balance, get_meta, get_supply, lock_nft, mint,
    mint_nft, nft_owner, nft_record, ownerships, receive_nft, transfer, transfer_nft, unlock_nft, NftRecord,
    TokenContract, TokenFlags, TokenMeta,
};

use std::rc::Rc;
use vela_core::Address;
use vela_runtime::ContractRegistry;

/// Deploys the four native contracts into `registry` at their symbolic
/// addresses, as genesis would (spec.md §5, "Genesis").
pub fn install_natives(registry: &mut ContractRegistry) {
    let contracts: Vec<(&str, Rc<dyn vela_runtime::NativeContract>)> = vec![
        ("token", Rc::new(TokenContract)),
        ("account", Rc::new(AccountContract)),
        ("staking", Rc::new(StakingContract)),
        ("gas", Rc::new(GasContract)),
    ];
    for (name, contract) in contracts {
        let address = Address::for_contract(name).expect("static contract name derives a valid address");
        registry.register_native(address, contract);
    }
}
