//! Describe Certificate Authority Use Case
//!
//! Reports the certificate authority settings of the current configuration
//! snapshot.

use kernel::di::Injectable;
use kernel::use_case::UseCase;
use std::convert::Infallible;
use std::sync::Arc;

use crate::application::config::{CaConfiguration, CdaConfiguration};

pub struct DescribeCertificateAuthorityUseCase {
    configuration: Arc<CdaConfiguration>,
}

impl Injectable for DescribeCertificateAuthorityUseCase {
    type Dependencies = (Arc<CdaConfiguration>,);

    fn inject((configuration,): Self::Dependencies) -> Self {
        Self { configuration }
    }
}

impl UseCase for DescribeCertificateAuthorityUseCase {
    type Input = ();
    type Output = CaConfiguration;
    type Error = Infallible;

    async fn apply(&self, _input: ()) -> Result<CaConfiguration, Infallible> {
        Ok(self.configuration.certificate_authority().clone())
    }
}
