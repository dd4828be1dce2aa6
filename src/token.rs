use std::io::Write;

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use is_terminal::IsTerminal;

use crate::error::{FeedAuthError, Result};
use crate::report::{Icon, Reporter};

/// Somewhere to get an access token for an organization from.
#[async_trait]
pub trait TokenSource: Send {
    /// Returns the token for `organization`, or `None` if the operator chose
    /// not to provide one.
    async fn request_token(&mut self, organization: &str) -> Result<Option<String>>;
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    async fn request_token(&mut self, organization: &str) -> Result<Option<String>> {
        (**self).request_token(organization).await
    }
}

/// Asks the operator to paste a Personal Access Token. Reads without echo
/// on a terminal, or a single line from standard input otherwise.
#[derive(Debug)]
pub struct PromptTokenSource {
    reporter: Reporter,
    interactive: bool,
}

impl PromptTokenSource {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            reporter,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    fn print_instructions(&self, organization: &str) {
        println!(
            "\n{}To create a Personal Access Token (PAT):",
            self.reporter.icon(Icon::Memo)
        );
        println!("   1. Visit: https://dev.azure.com/{organization}/_usersSettings/tokens");
        println!("   2. Click \"New Token\"");
        println!("   3. Set a name (e.g., \"npm-feed-access\")");
        println!("   4. Under \"Scopes\", select \"Packaging\" → \"Read\"");
        println!("   5. Set expiration (recommend 1 year or longer)");
        println!("   6. Click \"Create\" and copy the token\n");
    }
}

#[async_trait]
impl TokenSource for PromptTokenSource {
    async fn request_token(&mut self, organization: &str) -> Result<Option<String>> {
        self.print_instructions(organization);
        let prompt = format!(
            "{}Paste your PAT for {organization}",
            self.reporter.icon(Icon::Key)
        );

        let input = if self.interactive {
            async_std::task::spawn_blocking(move || {
                Password::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .allow_empty_password(true)
                    .interact()
            })
            .await
            .map_err(FeedAuthError::TokenInputError)?
        } else {
            print!("{prompt}: ");
            std::io::stdout()
                .flush()
                .map_err(FeedAuthError::TokenInputError)?;
            let mut line = String::new();
            async_std::io::stdin()
                .read_line(&mut line)
                .await
                .map_err(FeedAuthError::TokenInputError)?;
            line
        };

        let token = input.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }
}
