pub mod credentials;

pub use credentials::{
    AuthToken, CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider,
    mask_token,
};
