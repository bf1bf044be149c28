use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ReplyMarkup};

use db::models::{Channel, District, Region};

use crate::{callback::Callback, PayloadData};

const CHECK_SUBSCRIBE_MSG: &str = "✅ I joined, check again";
const BACK_MSG: &str = "« Back";

#[derive(Debug, Default)]
pub(crate) struct KeyboardBuilder {
    keys: Vec<InlineKeyboardButton>,
    columns: usize,
}

impl KeyboardBuilder {
    fn with_layout(rows_capacity: usize, columns: usize) -> Self {
        Self {
            keys: Vec::with_capacity(rows_capacity * columns),
            columns,
        }
    }
    fn callback<T, D>(mut self, text: T, data: D) -> Self
    where
        T: Into<String>,
        D: Into<String>,
    {
        self.keys.push(InlineKeyboardButton::callback(text, data));
        self
    }
    fn url<T>(mut self, text: T, url: Url) -> Self
    where
        T: Into<String>,
    {
        self.keys.push(InlineKeyboardButton::url(text, url));
        self
    }
}

impl From<KeyboardBuilder> for ReplyMarkup {
    fn from(value: KeyboardBuilder) -> Self {
        Self::InlineKeyboard(value.into())
    }
}

impl From<KeyboardBuilder> for InlineKeyboardMarkup {
    fn from(value: KeyboardBuilder) -> Self {
        Self::new(value.keys.chunks(value.columns).map(|row| row.to_owned()))
    }
}

pub(crate) struct Keyboards;

impl Keyboards {
    pub(crate) fn regions(regions: &[Region]) -> KeyboardBuilder {
        const COLUMNS: usize = 2;
        let mut keyboard = KeyboardBuilder::with_layout(regions.len() / COLUMNS + 1, COLUMNS);
        for region in regions {
            keyboard = keyboard.callback(region.name(), Callback::show_districts(region.id()).to_payload());
        }

        keyboard
    }
    pub(crate) fn districts(districts: &[District]) -> KeyboardBuilder {
        const COLUMNS: usize = 2;
        let mut keyboard = KeyboardBuilder::with_layout(districts.len() / COLUMNS + 2, COLUMNS);
        for district in districts {
            keyboard = keyboard.callback(district.name(), Callback::pick_district(district.id()).to_payload());
        }

        keyboard.callback(BACK_MSG, Callback::show_regions().to_payload())
    }
    /// One join link per unsatisfied channel plus a single re-check action
    pub(crate) fn join_prompt(channels: &[Channel]) -> KeyboardBuilder {
        let mut keyboard = KeyboardBuilder::with_layout(channels.len() + 1, 1);
        for channel in channels {
            match Url::parse(channel.invite_link()) {
                Ok(url) => keyboard = keyboard.url(channel.name(), url),
                // the button is lost but the re-check still works
                Err(e) => log::error!(
                    "invalid invite link {:?} for channel {}: {e}",
                    channel.invite_link(),
                    channel.id(),
                ),
            }
        }

        keyboard.callback(CHECK_SUBSCRIBE_MSG, Callback::check_subscribe().to_payload())
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::{InlineKeyboardButton as Btn, InlineKeyboardMarkup as Markup, ReplyMarkup as Reply};

    use super::*;

    #[test]
    fn test_regions_keyboard_two_columns() {
        let regions = regions(&["Tashkent", "Samarkand", "Bukhara"]);

        let res: ReplyMarkup = Keyboards::regions(&regions).into();
        let expected = vec![
            vec![
                Btn::callback("Tashkent", "region:1"),
                Btn::callback("Samarkand", "region:2"),
            ],
            vec![Btn::callback("Bukhara", "region:3")],
        ];
        similar_asserts::assert_eq!(res, Reply::InlineKeyboard(Markup::new(expected)));
    }

    #[test]
    fn test_districts_keyboard_has_back_button() {
        let districts = districts(5, &["Chilonzor"]);

        let res: Markup = Keyboards::districts(&districts).into();
        let expected = vec![vec![
            Btn::callback("Chilonzor", "district:1"),
            Btn::callback(BACK_MSG, "regions"),
        ]];
        similar_asserts::assert_eq!(res, Markup::new(expected));
    }

    #[test]
    fn test_join_prompt_lists_links_and_recheck() {
        let channels = channels(&[("news", "https://t.me/uz_news"), ("jobs", "https://t.me/uz_jobs")]);

        let res: Markup = Keyboards::join_prompt(&channels).into();
        let expected = vec![
            vec![Btn::url("news", Url::parse("https://t.me/uz_news").unwrap())],
            vec![Btn::url("jobs", Url::parse("https://t.me/uz_jobs").unwrap())],
            vec![Btn::callback(CHECK_SUBSCRIBE_MSG, "checksub")],
        ];
        similar_asserts::assert_eq!(res, Markup::new(expected));
    }

    #[test]
    fn test_join_prompt_skips_unparsable_link() {
        let channels = channels(&[("broken", "not a url")]);

        let res: Markup = Keyboards::join_prompt(&channels).into();
        let expected = vec![vec![Btn::callback(CHECK_SUBSCRIBE_MSG, "checksub")]];
        similar_asserts::assert_eq!(res, Markup::new(expected));
    }

    fn regions(names: &[&str]) -> Vec<Region> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Region::new(i as i64 + 1, *name))
            .collect()
    }

    fn districts(region_id: i64, names: &[&str]) -> Vec<District> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| District::new(i as i64 + 1, *name, region_id))
            .collect()
    }

    fn channels(rows: &[(&str, &str)]) -> Vec<Channel> {
        rows.iter()
            .enumerate()
            .map(|(i, (name, link))| Channel::new(i as i64 + 1, *name, "-100500", *link))
            .collect()
    }
}
