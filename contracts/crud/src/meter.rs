use soroban_sdk::{token, Address, Env, String, Symbol};

/// Receives lease fee charges computed by the engine.
///
/// A denied charge must trap: the host then discards every write of the
/// invocation, so no operation commits without paying.
pub trait ResourceMeter {
    fn consume(&self, uuid: &String, payer: &Address, amount: u64);
}

/// Charges fees in the configured Stellar asset, paid to this contract.
/// Without a token the charge is only published.
pub struct TokenMeter {
    env: Env,
    token: Option<Address>,
}

impl TokenMeter {
    pub fn new(env: Env, token: Option<Address>) -> Self {
        Self { env, token }
    }
}

impl ResourceMeter for TokenMeter {
    fn consume(&self, uuid: &String, payer: &Address, amount: u64) {
        if amount == 0 {
            return;
        }

        if let Some(token) = &self.token {
            let client = token::Client::new(&self.env, token);
            client.transfer(payer, &self.env.current_contract_address(), &i128::from(amount));
        }

        self.env.events().publish(
            (Symbol::new(&self.env, "lease_fee"), uuid.clone()),
            (payer.clone(), amount),
        );
    }
}
