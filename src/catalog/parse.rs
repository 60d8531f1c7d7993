//! XML → record conversion for the BoardGameGeek XML API 2.
//!
//! All functions are pure over the response body so they can be tested and
//! benchmarked without the network. Missing optional nodes fall back to
//! [`UNKNOWN`], an empty list or `None`; only an unparsable document or an item
//! without an `id` is an error.

use roxmltree::{Document, Node};
use thiserror::Error;

use super::models::{GameDetail, HotGame, SearchResult, UNKNOWN};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

/// `/search` のレスポンスを解析する
pub fn parse_search(xml: &str) -> Result<Vec<SearchResult>, ParseError> {
    let doc = Document::parse(xml)?;
    items(&doc)
        .map(|item| -> Result<SearchResult, ParseError> {
            Ok(SearchResult {
                id: item_id(item)?,
                title: primary_name(item).unwrap_or(UNKNOWN).to_string(),
                year: child_value(item, "yearpublished").unwrap_or(UNKNOWN).to_string(),
            })
        })
        .collect()
}

/// `/thing?stats=1` のレスポンスを解析する
pub fn parse_game_details(xml: &str) -> Result<Vec<GameDetail>, ParseError> {
    let doc = Document::parse(xml)?;
    items(&doc).map(game_detail).collect()
}

/// `/hot` のレスポンスを解析する。`site_url` から詳細ページURLを組み立て、最大 `limit` 件を返す
pub fn parse_hot_games(xml: &str, site_url: &str, limit: usize) -> Result<Vec<HotGame>, ParseError> {
    let doc = Document::parse(xml)?;
    items(&doc)
        .take(limit)
        .map(|item| -> Result<HotGame, ParseError> {
            let id = item_id(item)?;
            Ok(HotGame {
                url: game_url(site_url, &id),
                title: primary_name(item).unwrap_or(UNKNOWN).to_string(),
                rank: item.attribute("rank").unwrap_or(UNKNOWN).to_string(),
                year: child_value(item, "yearpublished").unwrap_or(UNKNOWN).to_string(),
                id,
            })
        })
        .collect()
}

/// Canonical detail-page URL for a game id.
pub fn game_url(site_url: &str, id: &str) -> String {
    format!("{}/boardgame/{}", site_url.trim_end_matches('/'), id)
}

fn game_detail(item: Node<'_, '_>) -> Result<GameDetail, ParseError> {
    let mut categories = Vec::new();
    let mut mechanics = Vec::new();
    for link in children(item, "link") {
        let Some(value) = link.attribute("value") else { continue };
        match link.attribute("type") {
            Some("boardgamecategory") => categories.push(value.to_string()),
            Some("boardgamemechanic") => mechanics.push(value.to_string()),
            _ => {}
        }
    }

    let ratings = child(item, "statistics").and_then(|s| child(s, "ratings"));
    let rating_value = |name: &'static str| ratings.and_then(|r| child_value(r, name)).map(str::to_string);
    let scalar = |name: &'static str| child_value(item, name).unwrap_or(UNKNOWN).to_string();

    Ok(GameDetail {
        id: item_id(item)?,
        title: primary_name(item).unwrap_or(UNKNOWN).to_string(),
        description: child(item, "description")
            .and_then(|d| d.text())
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        year: scalar("yearpublished"),
        min_players: scalar("minplayers"),
        max_players: scalar("maxplayers"),
        playing_time: scalar("playingtime"),
        complexity: rating_value("averageweight"),
        rating: rating_value("average"),
        categories,
        mechanics,
    })
}

fn items<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    children(doc.root_element(), "item")
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

fn child_value<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<&'a str> {
    child(node, name).and_then(|c| c.attribute("value"))
}

fn item_id(item: Node<'_, '_>) -> Result<String, ParseError> {
    item.attribute("id")
        .map(str::to_string)
        .ok_or(ParseError::MissingAttribute { element: "item", attribute: "id" })
}

/// `type="primary"` の name を優先し、無ければ最初の name を使う
fn primary_name<'a, 'input: 'a>(item: Node<'a, 'input>) -> Option<&'a str> {
    children(item, "name")
        .find(|n| n.attribute("type") == Some("primary"))
        .or_else(|| child(item, "name"))
        .and_then(|n| n.attribute("value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items total="3" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item type="boardgame" id="13">
        <name type="primary" value="CATAN"/>
        <yearpublished value="1995" />
    </item>
    <item type="boardgame" id="278">
        <name type="alternate" value="Catan Card Game"/>
    </item>
    <item type="boardgame" id="27710">
        <name type="primary" value="Catan Dice Game"/>
        <yearpublished value="2007" />
    </item>
</items>"#;

    const THING_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item type="boardgame" id="13">
        <thumbnail>https://cf.geekdo-images.com/thumb.jpg</thumbnail>
        <name type="alternate" sortindex="1" value="Die Siedler von Catan" />
        <name type="primary" sortindex="1" value="CATAN" />
        <name type="alternate" sortindex="1" value="カタン" />
        <description>In CATAN, players try to be the dominant force on the island of Catan.</description>
        <yearpublished value="1995" />
        <minplayers value="3" />
        <maxplayers value="4" />
        <playingtime value="120" />
        <link type="boardgamecategory" id="1021" value="Economic" />
        <link type="boardgamedesigner" id="11" value="Klaus Teuber" />
        <link type="boardgamecategory" id="1026" value="Negotiation" />
        <link type="boardgamemechanic" id="2072" value="Dice Rolling" />
        <link type="boardgamepublisher" id="37" value="KOSMOS" />
        <link type="boardgamemechanic" id="2004" value="Set Collection" />
        <statistics page="1">
            <ratings>
                <usersrated value="125000" />
                <average value="7.1" />
                <bayesaverage value="6.9" />
                <averageweight value="2.29" />
            </ratings>
        </statistics>
    </item>
    <item type="boardgame" id="99999">
        <name type="primary" value="Sparse Game" />
    </item>
</items>"#;

    #[test]
    fn search_keeps_order_and_defaults_year() {
        let results = parse_search(SEARCH_XML).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["13", "278", "27710"]);
        assert_eq!(results[0].title, "CATAN");
        assert_eq!(results[0].year, "1995");
        assert_eq!(results[1].title, "Catan Card Game");
        assert_eq!(results[1].year, UNKNOWN);
    }

    #[test]
    fn search_empty_items_is_empty() {
        let results = parse_search(r#"<items total="0"></items>"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = parse_search("<items><item id=\"1\">").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn item_without_id_is_rejected() {
        let err = parse_search(r#"<items><item><name value="x"/></item></items>"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { attribute: "id", .. }));
    }

    #[test]
    fn details_pick_primary_name_and_bucket_links() {
        let details = parse_game_details(THING_XML).unwrap();
        assert_eq!(details.len(), 2);
        let catan = &details[0];
        assert_eq!(catan.id, "13");
        assert_eq!(catan.title, "CATAN");
        assert!(catan.description.starts_with("In CATAN"));
        assert_eq!(catan.year, "1995");
        assert_eq!(catan.min_players, "3");
        assert_eq!(catan.max_players, "4");
        assert_eq!(catan.playing_time, "120");
        assert_eq!(catan.rating.as_deref(), Some("7.1"));
        assert_eq!(catan.complexity.as_deref(), Some("2.29"));
        assert_eq!(catan.categories, ["Economic", "Negotiation"]);
        assert_eq!(catan.mechanics, ["Dice Rolling", "Set Collection"]);
    }

    #[test]
    fn details_default_missing_nodes() {
        let details = parse_game_details(THING_XML).unwrap();
        let sparse = &details[1];
        assert_eq!(sparse.title, "Sparse Game");
        assert_eq!(sparse.description, UNKNOWN);
        assert_eq!(sparse.year, UNKNOWN);
        assert_eq!(sparse.min_players, UNKNOWN);
        assert_eq!(sparse.max_players, UNKNOWN);
        assert_eq!(sparse.playing_time, UNKNOWN);
        assert_eq!(sparse.rating, None);
        assert_eq!(sparse.complexity, None);
        assert!(sparse.categories.is_empty());
        assert!(sparse.mechanics.is_empty());
    }

    #[test]
    fn hot_games_keep_rank_and_build_url() {
        let xml = r#"<items termsofuse="x">
            <item id="342942" rank="1"><thumbnail value="t"/><name value="Ark Nova"/><yearpublished value="2021"/></item>
            <item id="224517" rank="2"><name value="Brass: Birmingham"/></item>
            <item id="1" rank="3"><name value="Die Macher"/><yearpublished value="1986"/></item>
        </items>"#;
        let hot = parse_hot_games(xml, "https://boardgamegeek.com/", 2).unwrap();
        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].rank, "1");
        assert_eq!(hot[0].title, "Ark Nova");
        assert_eq!(hot[0].url, "https://boardgamegeek.com/boardgame/342942");
        assert_eq!(hot[1].year, UNKNOWN);
    }
}
