//! Request dispatcher: the external boundary of the vault ledger.
//!
//! Runs each [`Request`] through the gates of [`RequestPhase`]:
//!
//! 1. **Received**: replay check, name bounds, non-zero amount
//! 2. **Resolved**: find the vault (or derive the new vault's address)
//! 3. **Authorized**: [`AuthorizationGuard`]
//! 4. **Applied**: [`TransferEngine`] / [`VaultLedger`]
//! 5. **Completed**: receipt appended, result returned
//!
//! Creation funds the new vault with the reserve floor in the same step
//! that inserts it. A create has no signer other than its owner, so the
//! creator is the recorded owner by construction and the Authorized gate
//! passes straight through.

use parking_lot::RwLock;
use treasury_ledger::{AddressDeriver, AuthorizationGuard, Operation, TransferEngine, VaultLedger};
use treasury_types::{
    Identity, LedgerConfig, Receipt, ReceiptType, Result, TreasuryError, VaultAddress,
};

use crate::phase::{Rejection, RequestPhase};
use crate::replay::ReplayGuard;
use crate::request::{Command, Request, VaultTarget};

/// What a completed request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A vault was created at this address.
    Created(VaultAddress),
    /// The vault's balance after a deposit or withdrawal.
    Balance(u64),
}

/// A completed request.
#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: Outcome,
    pub receipt: Receipt,
}

pub struct RequestDispatcher {
    config: LedgerConfig,
    ledger: VaultLedger,
    guard: AuthorizationGuard,
    engine: TransferEngine,
    replay: ReplayGuard,
    receipts: RwLock<Vec<Receipt>>,
}

impl RequestDispatcher {
    /// Dispatcher over a fresh ledger with the off-curve deriver.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is out of bounds.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let deriver = AddressDeriver::new(&config);
        Self::with_deriver(config, deriver)
    }

    /// Dispatcher over a fresh ledger with a custom deriver.
    pub fn with_deriver(config: LedgerConfig, deriver: AddressDeriver) -> Result<Self> {
        config.validate()?;
        let ledger = VaultLedger::new(deriver);
        let guard = AuthorizationGuard::for_ledger(&ledger);
        let engine = TransferEngine::from_config(&config);
        let replay = ReplayGuard::new(config.replay_cache_size);
        Ok(Self {
            config,
            ledger,
            guard,
            engine,
            replay,
            receipts: RwLock::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &VaultLedger {
        &self.ledger
    }

    /// All receipts issued so far, in completion order.
    ///
    /// Receipts are appended after the vault lock is released, so under
    /// concurrency two receipts for the same vault may appear in the reverse
    /// of the order their changes were applied. `balance_after` always
    /// reflects the state the request itself produced.
    #[must_use]
    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.read().clone()
    }

    /// Current balance of the vault at `address`.
    pub fn balance(&self, address: &VaultAddress) -> Result<u64> {
        Ok(self.ledger.get(address)?.balance)
    }

    /// Create a vault owned by `owner`.
    pub fn create(&self, owner: Identity, name: &str) -> std::result::Result<VaultAddress, Rejection> {
        Ok(self.dispatch(Request::create(owner, name))?.receipt.vault)
    }

    /// Deposit `amount` into `target` on behalf of `depositor`.
    pub fn deposit(
        &self,
        target: impl Into<VaultTarget>,
        amount: u64,
        depositor: Identity,
    ) -> std::result::Result<u64, Rejection> {
        Ok(self
            .dispatch(Request::deposit(target, amount, depositor))?
            .receipt
            .balance_after)
    }

    /// Withdraw `amount` from `vault` to `recipient`, signed by `signer`.
    pub fn withdraw(
        &self,
        vault: VaultAddress,
        amount: u64,
        recipient: Identity,
        signer: Identity,
    ) -> std::result::Result<u64, Rejection> {
        Ok(self
            .dispatch(Request::withdraw(vault, amount, recipient, signer))?
            .receipt
            .balance_after)
    }

    /// Run one request through every gate.
    pub fn dispatch(&self, request: Request) -> std::result::Result<Completion, Rejection> {
        if let Err(error) = self.replay.claim(request.id) {
            return Err(reject(&request, RequestPhase::Received, error));
        }

        let mut phase = RequestPhase::Received;
        match self.process(&request, &mut phase) {
            Ok(completion) => {
                self.replay.commit(request.id);
                self.receipts.write().push(completion.receipt.clone());
                tracing::info!(
                    request = %request.id,
                    operation = %request.command.operation(),
                    vault = %completion.receipt.vault,
                    amount = completion.receipt.amount,
                    balance = completion.receipt.balance_after,
                    "request completed"
                );
                Ok(completion)
            }
            Err(error) => {
                self.replay.release(request.id);
                Err(reject(&request, phase, error))
            }
        }
    }

    fn process(&self, request: &Request, phase: &mut RequestPhase) -> Result<Completion> {
        match &request.command {
            Command::Create { owner, name } => self.process_create(request, owner, name, phase),
            Command::Deposit {
                target,
                amount,
                depositor,
            } => self.process_deposit(request, target, *amount, depositor, phase),
            Command::Withdraw {
                vault,
                amount,
                recipient,
                signer,
            } => self.process_withdraw(request, vault, *amount, recipient, signer, phase),
        }
    }

    fn process_create(
        &self,
        request: &Request,
        owner: &Identity,
        name: &str,
        phase: &mut RequestPhase,
    ) -> Result<Completion> {
        self.check_name(name)?;
        *phase = phase.next();

        let (address, _) = self.ledger.deriver().derive(owner, name)?;
        if self.ledger.contains(&address) {
            return Err(TreasuryError::AlreadyExists(address));
        }
        *phase = phase.next();
        // The signer is the owner being recorded.
        *phase = phase.next();

        let opening = self.engine.reserve_floor();
        let vault = self.ledger.open(owner, name, opening)?;
        Ok(Completion {
            outcome: Outcome::Created(vault.address()),
            receipt: Receipt::new(
                request.id,
                ReceiptType::VaultCreated,
                vault.address(),
                *owner,
                None,
                opening,
                opening,
            ),
        })
    }

    fn process_deposit(
        &self,
        request: &Request,
        target: &VaultTarget,
        amount: u64,
        depositor: &Identity,
        phase: &mut RequestPhase,
    ) -> Result<Completion> {
        check_amount(amount)?;
        if let VaultTarget::Seeds { name, .. } = target {
            self.check_name(name)?;
        }
        *phase = phase.next();

        let vault = match target {
            VaultTarget::Address(address) => self.ledger.get(address)?,
            VaultTarget::Seeds { owner, name } => self.ledger.find(owner, name)?.snapshot(),
        };
        *phase = phase.next();

        self.guard.authorize(&vault, depositor, Operation::Deposit)?;
        *phase = phase.next();

        let balance = self.engine.deposit(&self.ledger, &vault.address, amount)?;
        Ok(Completion {
            outcome: Outcome::Balance(balance),
            receipt: Receipt::new(
                request.id,
                ReceiptType::Deposited,
                vault.address,
                *depositor,
                None,
                amount,
                balance,
            ),
        })
    }

    fn process_withdraw(
        &self,
        request: &Request,
        address: &VaultAddress,
        amount: u64,
        recipient: &Identity,
        signer: &Identity,
        phase: &mut RequestPhase,
    ) -> Result<Completion> {
        check_amount(amount)?;
        *phase = phase.next();

        let vault = self.ledger.get(address)?;
        *phase = phase.next();

        self.guard.authorize(&vault, signer, Operation::Withdraw)?;
        *phase = phase.next();

        let balance = self
            .engine
            .withdraw(&self.ledger, address, amount, recipient)?;
        Ok(Completion {
            outcome: Outcome::Balance(balance),
            receipt: Receipt::new(
                request.id,
                ReceiptType::Withdrawn,
                *address,
                *signer,
                Some(*recipient),
                amount,
                balance,
            ),
        })
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TreasuryError::InvalidInput {
                reason: "vault name must not be empty".to_string(),
            });
        }
        if name.len() > self.config.max_name_len {
            return Err(TreasuryError::InvalidInput {
                reason: format!(
                    "vault name is {} bytes, maximum is {}",
                    name.len(),
                    self.config.max_name_len
                ),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .field("receipts", &self.receipts.read().len())
            .finish_non_exhaustive()
    }
}

fn reject(request: &Request, phase: RequestPhase, error: TreasuryError) -> Rejection {
    if error.is_fatal() {
        tracing::error!(
            request = %request.id,
            operation = %request.command.operation(),
            %phase,
            error = %error,
            "request failed"
        );
    } else {
        tracing::warn!(
            request = %request.id,
            operation = %request.command.operation(),
            signer = %request.command.signer(),
            %phase,
            kind = ?error.kind(),
            "request rejected"
        );
    }
    Rejection { phase, error }
}

fn check_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(TreasuryError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}
