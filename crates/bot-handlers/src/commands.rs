use teloxide::macros::BotCommands;

#[derive(BotCommands, Clone, Copy)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "register and pick your region")]
    Start,
    #[command(description = "display this text")]
    Help,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum AdminCommand {
    #[command(description = "add a required channel: /addchannel <@username or chat id> [invite link]")]
    AddChannel(String),
    #[command(description = "remove a required channel: /delchannel <id>")]
    DelChannel(String),
    #[command(description = "list required channels")]
    Channels,
    #[command(description = "add a region: /addregion <name>")]
    AddRegion(String),
    #[command(description = "add a district: /adddistrict <region id> <name>")]
    AddDistrict(String),
    #[command(description = "bot statistics")]
    Stats,
}
