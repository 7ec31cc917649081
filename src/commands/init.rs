//! `hg init`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{Result, Session};

impl Session {
    /// Create a new repository.
    ///
    /// With `dest = None` the repository is created in the server's
    /// working directory.
    pub async fn init(&mut self, dest: Option<&str>) -> Result<()> {
        let mut builder = ArgBuilder::new("init");
        if let Some(dest) = dest {
            builder = builder.positional(&[dest]);
        }
        let argv = builder.finish();

        self.get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "init failed")?;
        Ok(())
    }
}
