//! Integration tests for the seven testable scenarios of spec.md §8, run
//! against a freshly bootstrapped [`vela::Nexus`].

use num_bigint::BigInt;
use vela::core::crypto::KeyPair;
use vela::core::{Address, Timestamp};
use vela::vm::VMObject;
use vela::{Chain, Nexus, NexusConfig, Transaction};

fn keypair_address() -> (KeyPair, Address) {
    let kp = KeyPair::generate();
    let address = Address::from_public_key(kp.compressed_public_key());
    (kp, address)
}

#[allow(clippy::too_many_arguments)]
fn signed_call(
    kp: &KeyPair,
    payer: Address,
    target_contract: &Address,
    method: &str,
    args: &[VMObject],
    gas_price: u64,
    gas_limit: u64,
    nonce: u64,
) -> Transaction {
    let mut tx = Transaction::build_call(payer, "main", target_contract, method, args, gas_price, gas_limit, Timestamp::new(1_000_000), nonce);
    let sig = kp.sign(tx.signing_hash().as_bytes());
    tx.add_signature(kp.compressed_public_key(), sig);
    tx
}

fn bootstrapped() -> (Nexus, KeyPair, Address) {
    let mut nexus = Nexus::new("tests");
    let (kp, owner) = keypair_address();
    nexus.bootstrap(owner, &NexusConfig::default(), Timestamp::new(0)).unwrap();
    (nexus, kp, owner)
}

fn token_address() -> Address {
    Address::for_contract("token").unwrap()
}

fn staking_address() -> Address {
    Address::for_contract("staking").unwrap()
}

fn account_address() -> Address {
    Address::for_contract("account").unwrap()
}

#[test]
fn scenario_1_genesis_creates_validator_and_tokens() {
    let (nexus, _kp, owner) = bootstrapped();
    let root = nexus.root_chain();
    assert!(root.get_token_supply("KCAL") > BigInt::from(0));
    assert!(root.height() >= 1);
    assert!(nexus.is_validator(&owner));
    let random = Address::from_public_key(KeyPair::generate().compressed_public_key());
    assert!(!nexus.is_validator(&random));
}

#[test]
fn scenario_2_fungible_transfer_debits_fee() {
    let (mut nexus, owner_kp, owner) = bootstrapped();
    let (_user_kp, user) = keypair_address();
    let token = token_address();

    {
        let root = nexus.chain_mut("main").unwrap();
        let mut cs = root.storage_mut().fork_change_set();
        vela::contracts::mint(&mut cs, "KCAL", &owner, &BigInt::from(10_000)).unwrap();
        root.storage_mut().commit(cs);
    }

    let balance_before = nexus.root_chain().get_token_balance("KCAL", &owner);
    let args = [
        VMObject::Address(owner),
        VMObject::Address(user),
        VMObject::from("KCAL".to_string()),
        VMObject::from(400i64),
    ];
    let tx = signed_call(&owner_kp, owner, &token, "Transfer", &args, 1, 100_000, 0);
    let tx_hash = tx.content_hash();

    let root = nexus.chain_mut("main").unwrap();
    root.add_block(owner, Timestamp::new(1000), vec![tx]).unwrap();

    let fee = root.get_transaction_fee(&tx_hash).unwrap();
    assert_eq!(root.get_token_balance("KCAL", &user), BigInt::from(400));
    assert_eq!(root.get_token_balance("KCAL", &owner), &balance_before - 400 - fee as i64);
}

#[test]
fn scenario_3_same_chain_transfer_with_no_fuel_fails_atomically() {
    let (mut nexus, owner, user_kp, user, receiver) = {
        let (mut nexus, owner_kp, owner) = bootstrapped();
        let (user_kp, user) = keypair_address();
        let (_recv_kp, receiver) = keypair_address();
        {
            let root = nexus.chain_mut("main").unwrap();
            let mut cs = root.storage_mut().fork_change_set();
            vela::contracts::mint(&mut cs, "KCAL", &user, &BigInt::from(400)).unwrap();
            root.storage_mut().commit(cs);
        }
        let _ = owner_kp;
        (nexus, owner, user_kp, user, receiver)
    };
    let token = token_address();

    let args = [
        VMObject::Address(user),
        VMObject::Address(receiver),
        VMObject::from("KCAL".to_string()),
        VMObject::from(400i64),
    ];
    let tx = signed_call(&user_kp, user, &token, "Transfer", &args, 1, 100_000, 0);

    let root = nexus.chain_mut("main").unwrap();
    let result = root.add_block(owner, Timestamp::new(1000), vec![tx]);
    assert!(result.is_err());
    assert_eq!(root.get_token_balance("KCAL", &receiver), BigInt::from(0));
    assert_eq!(root.get_token_balance("KCAL", &user), BigInt::from(400));
}

#[test]
fn scenario_4_side_chain_transfer_settles_across_two_chains() {
    let (mut nexus, owner_kp, owner) = bootstrapped();
    let (sender_kp, sender) = keypair_address();
    let (_recv_kp, receiver) = keypair_address();
    let token = token_address();

    {
        let root = nexus.chain_mut("main").unwrap();
        let mut cs = root.storage_mut().fork_change_set();
        vela::contracts::mint(&mut cs, "KCAL", &owner, &BigInt::from(1_000)).unwrap();
        root.storage_mut().commit(cs);
    }

    let send_args = [
        VMObject::Address(owner),
        VMObject::Address(sender),
        VMObject::from("KCAL".to_string()),
        VMObject::from(10i64),
    ];
    let tx1 = signed_call(&owner_kp, owner, &token, "Transfer", &send_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(1000), vec![tx1]).unwrap();

    let escrow_args = [
        VMObject::Address(sender),
        VMObject::from("KCAL".to_string()),
        VMObject::from(5i64),
        VMObject::from(0i64),
        VMObject::from("privacy".to_string()),
        VMObject::Address(receiver),
    ];
    let tx2 = signed_call(&sender_kp, sender, &token, "SideChainSend", &escrow_args, 0, 100_000, 0);
    let tx2_hash = tx2.content_hash();
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(2000), vec![tx2]).unwrap();

    nexus.settle("main", "privacy", tx2_hash).unwrap();

    assert_eq!(nexus.chain("privacy").unwrap().get_token_balance("KCAL", &receiver), BigInt::from(5));
    assert_eq!(nexus.chain("main").unwrap().get_token_balance("KCAL", &sender), BigInt::from(5));

    assert!(nexus.settle("main", "privacy", tx2_hash).is_err());
}

#[test]
fn scenario_5_nft_mint_transfer_burn() {
    let (mut nexus, owner_kp, owner) = bootstrapped();
    let (sender_kp, sender) = keypair_address();
    let (receiver_kp, receiver) = keypair_address();
    let token = token_address();

    let create_args = [
        VMObject::Address(owner),
        VMObject::from("COOL".to_string()),
        VMObject::from("Cool Token".to_string()),
        VMObject::from(0i64),
        VMObject::from(0i64),
        VMObject::from(0i64),
    ];
    let tx = signed_call(&owner_kp, owner, &token, "Create", &create_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(1000), vec![tx]).unwrap();

    let mint_args = [
        VMObject::Address(owner),
        VMObject::Address(sender),
        VMObject::from("COOL".to_string()),
        VMObject::from(vec![0x01u8, 0x03, 0x03, 0x07]),
        VMObject::from(vec![0x01u8, 0x04, 0x04, 0x06]),
    ];
    let tx = signed_call(&owner_kp, owner, &token, "MintNft", &mint_args, 0, 100_000, 1);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(2000), vec![tx]).unwrap();

    let owned = nexus.root_chain().get_token_ownerships("COOL");
    assert_eq!(owned.get(&sender).map(Vec::len), Some(1));
    assert_eq!(nexus.root_chain().get_token_supply("COOL"), BigInt::from(1));
    let id = owned[&sender][0];

    let transfer_args = [VMObject::Address(sender), VMObject::Address(receiver), VMObject::from("COOL".to_string()), VMObject::from(id as i64)];
    let tx = signed_call(&sender_kp, sender, &token, "TransferNft", &transfer_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(3000), vec![tx]).unwrap();

    let owned = nexus.root_chain().get_token_ownerships("COOL");
    assert_eq!(owned.get(&sender).map(Vec::len).unwrap_or(0), 0);
    assert_eq!(owned.get(&receiver).map(Vec::len), Some(1));

    let burn_args = [VMObject::Address(receiver), VMObject::from("COOL".to_string()), VMObject::from(id as i64)];
    let tx = signed_call(&receiver_kp, receiver, &token, "BurnNft", &burn_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(4000), vec![tx]).unwrap();

    let owned = nexus.root_chain().get_token_ownerships("COOL");
    assert_eq!(owned.get(&receiver).map(Vec::len).unwrap_or(0), 0);
    assert_eq!(nexus.root_chain().get_token_supply("COOL"), BigInt::from(1));
}

#[test]
fn scenario_5b_nft_side_chain_send_settles_ownership_and_rom_ram_on_the_destination_chain() {
    let (mut nexus, owner_kp, owner) = bootstrapped();
    let (sender_kp, sender) = keypair_address();
    let (_recv_kp, receiver) = keypair_address();
    let token = token_address();

    let create_args = [
        VMObject::Address(owner),
        VMObject::from("COOL".to_string()),
        VMObject::from("Cool Token".to_string()),
        VMObject::from(0i64),
        VMObject::from(0i64),
        VMObject::from(0i64),
    ];
    let tx = signed_call(&owner_kp, owner, &token, "Create", &create_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(1000), vec![tx]).unwrap();

    let mint_args = [
        VMObject::Address(owner),
        VMObject::Address(sender),
        VMObject::from("COOL".to_string()),
        VMObject::from(vec![0x01u8, 0x03, 0x03, 0x07]),
        VMObject::from(vec![0x01u8, 0x04, 0x04, 0x06]),
    ];
    let tx = signed_call(&owner_kp, owner, &token, "MintNft", &mint_args, 0, 100_000, 1);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(2000), vec![tx]).unwrap();
    let id = nexus.root_chain().get_token_ownerships("COOL")[&sender][0];

    let escrow_args = [
        VMObject::Address(sender),
        VMObject::from("COOL".to_string()),
        VMObject::from(id as i64),
        VMObject::from(0i64),
        VMObject::from("privacy".to_string()),
        VMObject::Address(receiver),
    ];
    let tx = signed_call(&sender_kp, sender, &token, "SideChainSend", &escrow_args, 0, 100_000, 0);
    let tx_hash = tx.content_hash();
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(3000), vec![tx]).unwrap();

    // Locked out of the sender's ownership on the source chain, not yet
    // owned anywhere on the destination chain.
    assert_eq!(nexus.root_chain().get_token_ownerships("COOL").get(&sender).map(Vec::len).unwrap_or(0), 0);
    assert!(nexus.chain("privacy").unwrap().get_token_ownerships("COOL").is_empty());

    nexus.settle("main", "privacy", tx_hash).unwrap();

    let owned = nexus.chain("privacy").unwrap().get_token_ownerships("COOL");
    assert_eq!(owned.get(&receiver), Some(&vec![id]));
    assert!(nexus.settle("main", "privacy", tx_hash).is_err(), "double-settle must be rejected");
}

#[test]
fn scenario_6_account_name_registration() {
    let (mut nexus, _owner_kp, owner) = bootstrapped();
    let (user_kp, user) = keypair_address();
    let account = account_address();

    {
        let root = nexus.chain_mut("main").unwrap();
        let mut cs = root.storage_mut().fork_change_set();
        vela::contracts::mint(&mut cs, "KCAL", &user, &BigInt::from(10)).unwrap();
        root.storage_mut().commit(cs);
    }

    for (i, (name, should_fail)) in [("hel", true), ("HELLO", true), ("hello!", true), ("hello", false)].into_iter().enumerate() {
        let args = [VMObject::Address(user), VMObject::from(name.to_string())];
        let tx = signed_call(&user_kp, user, &account, "Register", &args, 0, 100_000, i as u64);
        let result = nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(1000 + i as u64), vec![tx]);
        assert_eq!(result.is_err(), should_fail, "name {name:?}");
    }

    let root = nexus.root_chain();
    let cs = root.storage_ref().fork_change_set();
    assert_eq!(vela::contracts::lookup_address(&cs, "hello"), Some(user));
    assert_eq!(vela::contracts::lookup_name(&cs, &user).as_deref(), Some("hello"));

    let args = [VMObject::Address(user), VMObject::from("other".to_string())];
    let tx = signed_call(&user_kp, user, &account, "Register", &args, 0, 100_000, 99);
    assert!(nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(2000), vec![tx]).is_err());
}

#[test]
fn scenario_7_staking_claim_with_proxy() {
    let (mut nexus, owner, a_kp, a, b) = {
        let (mut nexus, owner_kp, owner) = bootstrapped();
        let (a_kp, a) = keypair_address();
        let (_b_kp, b) = keypair_address();
        {
            let root = nexus.chain_mut("main").unwrap();
            let mut cs = root.storage_mut().fork_change_set();
            vela::contracts::credit(&mut cs, "SOUL", &a, &BigInt::from(1000));
            root.storage_mut().commit(cs);
        }
        let _ = owner_kp;
        (nexus, owner, a_kp, a, b)
    };
    let staking = staking_address();

    let stake_args = [VMObject::Address(a), VMObject::from(1000i64)];
    let tx = signed_call(&a_kp, a, &staking, "Stake", &stake_args, 0, 100_000, 0);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(0), vec![tx]).unwrap();

    let proxy_args = [VMObject::Address(a), VMObject::Address(b), VMObject::from(30i64)];
    let tx = signed_call(&a_kp, a, &staking, "AddProxy", &proxy_args, 0, 100_000, 1);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(0), vec![tx]).unwrap();

    let claim_args = [VMObject::Address(a), VMObject::Address(a)];
    let tx = signed_call(&a_kp, a, &staking, "Claim", &claim_args, 0, 100_000, 2);
    nexus.chain_mut("main").unwrap().add_block(owner, Timestamp::new(86_400), vec![tx]).unwrap();

    let root = nexus.root_chain();
    let fuel_unit = BigInt::from(1000) / BigInt::from(500);
    let to_b = &fuel_unit * BigInt::from(30) / BigInt::from(100);
    let to_a = &fuel_unit - &to_b;
    assert_eq!(root.get_token_balance("KCAL", &b), to_b);
    assert_eq!(root.get_token_balance("KCAL", &a), to_a);
}
