//! The gas contract: the `AllowGas`/`SpendGas` pair that brackets every
//! transaction to fund and settle its metered execution (spec.md §4.4
//! "Gas contract").

use crate::token;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use vela_core::Address;
use vela_runtime::{encode_gas_escrow, encode_gas_payment, EventKind, NativeContract, Runtime};
use vela_vm::{VMObject, VmError, VmResult};

/// Fee payments settle in FuelToken (KCAL), the token staking accrues.
pub const FUEL_TOKEN: &str = "KCAL";

pub struct GasContract;

impl NativeContract for GasContract {
    fn name(&self) -> &str {
        "gas"
    }

    fn invoke(&self, runtime: &mut Runtime, method: &str, args: Vec<VMObject>) -> VmResult<VMObject> {
        match method {
            "AllowGas" => self.allow_gas(runtime, args),
            "SpendGas" => self.spend_gas(runtime, args),
            other => Err(VmError::UnknownInterop(format!("gas.{other}"))),
        }
    }
}

fn arg_address(args: &[VMObject], i: usize) -> VmResult<Address> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_address()
}

fn arg_int(args: &[VMObject], i: usize) -> VmResult<BigInt> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_int()
}

fn as_u64(value: &BigInt) -> VmResult<u64> {
    value.to_u64().ok_or_else(|| VmError::Thrown("gas amount does not fit in u64".to_string()))
}

impl GasContract {
    /// Escrows the fee budget before the rest of the transaction's script
    /// runs; `Runtime.Notify`'s `GasEscrow` interception sets `maxGas`/
    /// `gasPrice` from this call's payload.
    fn allow_gas(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let price = as_u64(&arg_int(&args, 1)?)?;
        let limit = as_u64(&arg_int(&args, 2)?)?;
        runtime.expect(runtime.is_witness(&from), "AllowGas requires the payer's witness")?;
        runtime.notify(EventKind::GasEscrow, from, encode_gas_escrow(limit, price));
        Ok(VMObject::Null)
    }

    /// Settles the fee after the script halts: debits the payer for
    /// `usedGas * gasPrice` and credits the block's producer.
    fn spend_gas(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        runtime.expect(runtime.is_witness(&from), "SpendGas requires the payer's witness")?;
        let amount = runtime.used_gas.saturating_mul(runtime.gas_price);
        let producer = runtime.block.producer;
        token::debit(runtime.change_set, FUEL_TOKEN, &from, &BigInt::from(amount))
            .map_err(|e| VmError::Thrown(e.to_string()))?;
        token::credit(runtime.change_set, FUEL_TOKEN, &producer, &BigInt::from(amount));
        runtime.notify(EventKind::GasPayment, from, encode_gas_payment(amount));
        Ok(VMObject::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use std::rc::Rc;
    use vela_core::Timestamp;
    use vela_runtime::{BlockContext, ContractRegistry};
    use vela_storage::{ChangeSet, Storage};

    fn test_runtime<'a>(change_set: &'a mut ChangeSet, producer: Address, used_gas: u64, gas_price: u64) -> Runtime<'a> {
        let mut runtime = Runtime::new(
            change_set,
            Rc::new(ContractRegistry::new()),
            BlockContext { chain_name: "main".to_string(), height: 1, timestamp: Timestamp::new(0), producer },
            vela_core::Hash256::ZERO,
            vec![],
            1_000_000,
            gas_price,
        );
        runtime.used_gas = used_gas;
        runtime
    }

    #[test]
    fn allow_gas_sets_max_gas_and_price_through_notify() {
        let storage = Storage::default();
        let mut cs = storage.fork_change_set();
        let payer = Address::for_contract("payer").unwrap();
        let producer = Address::for_contract("producer").unwrap();
        let mut runtime = test_runtime(&mut cs, producer, 0, 0);
        runtime.signers.push(payer);
        let contract = GasContract;
        contract.allow_gas(&mut runtime, vec![VMObject::Address(payer), VMObject::Int(BigInt::from(3)), VMObject::Int(BigInt::from(5000))]).unwrap();
        assert_eq!(runtime.max_gas, 5000);
        assert_eq!(runtime.gas_price, 3);
    }

    #[test]
    fn spend_gas_debits_payer_and_credits_the_block_producer() {
        let storage = Storage::default();
        let mut cs = storage.fork_change_set();
        let payer = Address::for_contract("payer").unwrap();
        let producer = Address::for_contract("producer").unwrap();
        token::create(&mut cs, FUEL_TOKEN, "Fuel", 10, BigInt::zero(), Default::default()).unwrap();
        token::mint(&mut cs, FUEL_TOKEN, &payer, &BigInt::from(1000)).unwrap();

        let mut runtime = test_runtime(&mut cs, producer, 100, 2);
        runtime.signers.push(payer);
        let contract = GasContract;
        contract.spend_gas(&mut runtime, vec![VMObject::Address(payer)]).unwrap();

        assert_eq!(token::get_balance(&cs, FUEL_TOKEN, &payer), BigInt::from(800));
        assert_eq!(token::get_balance(&cs, FUEL_TOKEN, &producer), BigInt::from(200));
    }
}
