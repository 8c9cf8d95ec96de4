use crate::{Layer, Memory, State};
use clickfarm_types::execution::{Event, Instruction, Output, Transaction};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use rand::{rngs::StdRng, SeedableRng};

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// A signing account that tracks its own nonce.
pub struct Actor {
    pub private: PrivateKey,
    pub public: PublicKey,
    pub nonce: u64,
}

impl Actor {
    pub fn new(seed: u64) -> Self {
        let (private, public) = create_account_keypair(seed);
        Self {
            private,
            public,
            nonce: 0,
        }
    }

    /// Sign `instruction` at the next nonce.
    pub fn sign(&mut self, instruction: Instruction) -> Transaction {
        let tx = Transaction::sign(&self.private, self.nonce, instruction);
        self.nonce += 1;
        tx
    }
}

/// Execute `transactions` at `now` and commit the result into `state`.
pub async fn execute_block(
    state: &mut Memory,
    authority: &PublicKey,
    now: u64,
    transactions: Vec<Transaction>,
) -> Vec<Output> {
    let mut layer = Layer::new(state, authority.clone(), now);
    let (outputs, _) = layer.execute(transactions).await;
    let changes = layer.commit();
    state.apply(changes).await;
    outputs
}

/// Events in `outputs`, dropping the echoed transactions.
pub fn events(outputs: &[Output]) -> Vec<Event> {
    outputs
        .iter()
        .filter_map(|output| match output {
            Output::Event(event) => Some(event.clone()),
            Output::Transaction(_) => None,
        })
        .collect()
}

/// Error codes in `outputs`, in order.
pub fn error_codes(outputs: &[Output]) -> Vec<u8> {
    events(outputs)
        .into_iter()
        .filter_map(|event| match event {
            Event::Error { code, .. } => Some(code),
            _ => None,
        })
        .collect()
}
