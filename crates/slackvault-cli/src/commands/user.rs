use anyhow::Result;
use slackvault_core::SlackService;
use slackvault_core::service::GetUserInput;
use tokio_util::sync::CancellationToken;

use crate::cli::UserArgs;
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    service: &SlackService,
    args: UserArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let input = GetUserInput {
        user: args.id,
        email: args.email,
    };
    let user = service.get_user(input, cancel).await?.user;

    if format.is_json() {
        return print_json(&user);
    }

    println!("ID:          {}", user.id);
    println!("Name:        {}", user.name);
    println!("Real name:   {}", user.real_name);
    println!("Display:     {}", user.display_name);
    if !user.email.is_empty() {
        println!("Email:       {}", user.email);
    }
    if !user.title.is_empty() {
        println!("Title:       {}", user.title);
    }
    if !user.status.is_empty() {
        println!("Status:      {} {}", user.status_emoji, user.status);
    }
    if !user.timezone.is_empty() {
        println!("Timezone:    {}", user.timezone);
    }
    println!("Bot:         {}", user.is_bot);
    println!("Admin:       {}", user.is_admin);
    Ok(())
}
