use std::fmt::Debug;

/// SigningCredential is the trait used by signers as the signing key.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is usable for signing.
    fn is_valid(&self) -> bool;
}

/// SignToken is the contract shared by every token signer.
///
/// The manual signer reproduces the service's canonicalization itself;
/// other implementations may delegate to a vendor SDK, as long as they
/// accept the same parameters and produce the same output.
///
/// Signing is a pure transformation: no I/O, no shared state.
pub trait SignToken: Debug + Send + Sync + Unpin + 'static {
    /// Parameters describing the token to sign.
    type Params;
    /// Credential used to compute the signature.
    type Credential: SigningCredential;
    /// Signed result.
    type Output;

    /// Sign `params` with `credential`.
    ///
    /// Implementations must not validate capability semantics (expiry,
    /// permission alphabets); callers do that beforehand. They must
    /// fail when no signing format exists for the parameters.
    fn sign_token(
        &self,
        params: &Self::Params,
        credential: &Self::Credential,
    ) -> crate::Result<Self::Output>;
}
