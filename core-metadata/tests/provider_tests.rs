//! Integration tests for the catalog clients
//!
//! HTTP is mocked; each test feeds canned API payloads and checks request
//! shape and error mapping.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_metadata::providers::{BandcampSearch, LastFmClient, SpotifyClient};
use core_metadata::MetadataError;
use mockall::mock;
use std::sync::Arc;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

const TOKEN_BODY: &str = r#"{"access_token": "tok-1", "token_type": "Bearer", "expires_in": 3600}"#;

fn is_token_request(req: &HttpRequest) -> bool {
    req.method == HttpMethod::Post && req.url.starts_with("https://accounts.spotify.com/api/token")
}

fn spotify(http: MockHttpClient) -> SpotifyClient {
    SpotifyClient::new(Arc::new(http), "id".to_string(), "secret".to_string(), 0)
}

fn lastfm(http: MockHttpClient) -> LastFmClient {
    LastFmClient::new(Arc::new(http), "key".to_string(), 0)
}

#[tokio::test]
async fn test_spotify_token_is_cached() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| {
            is_token_request(req)
                // base64("id:secret")
                && req.headers.get("Authorization").map(String::as_str) == Some("Basic aWQ6c2VjcmV0")
                && req.body.as_deref() == Some(&b"grant_type=client_credentials"[..])
        })
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, TOKEN_BODY)));
    http.expect_execute()
        .withf(|req| {
            req.url.starts_with("https://api.spotify.com/v1/search?q=artist%3A%22Morbid%20Angel%22")
                && req.headers.get("Authorization").map(String::as_str) == Some("Bearer tok-1")
        })
        .times(2)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"artists": {"items": [
                    {"id": "ma", "name": "Morbid Angel", "genres": ["death metal"], "popularity": 55,
                     "external_urls": {"spotify": "https://open.spotify.com/artist/ma"}}
                ]}}"#,
            ))
        });

    let client = spotify(http);
    for _ in 0..2 {
        let artists = client
            .search_artists(r#"artist:"Morbid Angel""#, 5)
            .await
            .unwrap();
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name, "Morbid Angel");
        assert_eq!(artists[0].genres, vec!["death metal"]);
        assert_eq!(
            artists[0].url.as_deref(),
            Some("https://open.spotify.com/artist/ma")
        );
    }
}

#[tokio::test]
async fn test_spotify_bad_credentials() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(is_token_request)
        .times(1)
        .returning(|_| Ok(HttpResponse::new(400, r#"{"error": "invalid_client"}"#)));

    let err = spotify(http).related_artists("x").await.unwrap_err();
    assert!(matches!(err, MetadataError::Auth(_)));
}

#[tokio::test]
async fn test_spotify_rate_limited() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(is_token_request)
        .returning(|_| Ok(HttpResponse::new(200, TOKEN_BODY)));
    http.expect_execute()
        .withf(|req| req.url.contains("/related-artists"))
        .returning(|_| {
            let mut response = HttpResponse::new(429, "");
            response
                .headers
                .insert("Retry-After".to_string(), "3".to_string());
            Ok(response)
        });

    let err = spotify(http).related_artists("abc").await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::RateLimited {
            retry_after_seconds: 3,
            ..
        }
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_spotify_unknown_artist_is_none() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(is_token_request)
        .returning(|_| Ok(HttpResponse::new(200, TOKEN_BODY)));
    http.expect_execute()
        .withf(|req| req.url.contains("/artists/missing"))
        .returning(|_| Ok(HttpResponse::new(404, r#"{"error": {"status": 404}}"#)));

    let client = spotify(http);
    assert!(client.artist("missing").await.unwrap().is_none());
    assert!(client.related_artists("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lastfm_similar_artists_request() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| {
            req.url.starts_with("https://ws.audioscrobbler.com/2.0/?method=artist.getsimilar&api_key=key&format=json")
                && req.url.contains("&artist=Bolt%20Thrower")
                && req.url.contains("&limit=3")
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"similarartists": {"artist": [{"name": "Benediction"}, {"name": "Asphyx"}]}}"#,
            ))
        });

    let similar = lastfm(http).similar_artists("Bolt Thrower", 3).await.unwrap();
    assert_eq!(similar, vec!["Benediction", "Asphyx"]);
}

#[tokio::test]
async fn test_lastfm_not_found_is_empty() {
    let mut http = MockHttpClient::new();
    http.expect_execute().returning(|_| {
        Ok(HttpResponse::new(
            200,
            r#"{"error": 6, "message": "The artist you supplied could not be found"}"#,
        ))
    });

    let client = lastfm(http);
    assert!(client.artist_top_tags("Nobody", 10).await.unwrap().is_empty());
    assert!(client
        .search_album("Nothing", None)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_lastfm_other_api_errors() {
    let mut http = MockHttpClient::new();
    http.expect_execute().returning(|_| {
        Ok(HttpResponse::new(
            403,
            r#"{"error": 10, "message": "Invalid API key"}"#,
        ))
    });

    let err = lastfm(http).album_top_tags("a", "b", 5).await.unwrap_err();
    match err {
        MetadataError::RemoteApi(message) => assert!(message.contains("Invalid API key")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_lastfm_search_album_falls_back_to_album_only() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| req.url.contains("album=Leprosy%20Death"))
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"results": {"albummatches": {"album": []}}}"#,
            ))
        });
    http.expect_execute()
        .withf(|req| req.url.contains("album=Leprosy&"))
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"results": {"albummatches": {"album": [
                    {"name": "Leprosy", "artist": "Death", "url": "https://www.last.fm/music/Death/Leprosy"}
                ]}}}"#,
            ))
        });

    let found = lastfm(http)
        .search_album("Leprosy", Some("Death"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.artist, "Death");
    assert_eq!(found.album, "Leprosy");
}

#[tokio::test]
async fn test_lastfm_network_error() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .returning(|_| Err(BridgeError::Timeout("read timed out".to_string())));

    let err = lastfm(http).similar_artists("x", 5).await.unwrap_err();
    assert!(matches!(err, MetadataError::NetworkError(_)));
}

#[tokio::test]
async fn test_bandcamp_search_matches_artist() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| {
            req.url == "https://bandcamp.com/search?q=Blood%20Incantation%20Hidden%20History&item_type=a"
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"<ul>
                <li class="searchresult"><div class="heading"><a href="https://fake.bandcamp.com/album/h">Hidden History</a></div>
                    <div class="subhead">by Cover Band</div></li>
                <li class="searchresult"><div class="heading"><a href="https://bloodincantation.bandcamp.com/album/hidden-history?from=search">Hidden History of the Human Race</a></div>
                    <div class="subhead">by Blood Incantation</div></li>
                </ul>"#,
            ))
        });

    let search = BandcampSearch::new(Arc::new(http), 0);
    let link = search
        .search("Blood Incantation", "Hidden History")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(link.artist, "Blood Incantation");
    assert_eq!(
        link.url,
        "https://bloodincantation.bandcamp.com/album/hidden-history"
    );
}

#[tokio::test]
async fn test_bandcamp_search_http_error() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .returning(|_| Ok(HttpResponse::new(503, "busy")));

    let search = BandcampSearch::new(Arc::new(http), 0);
    let err = search.search("a", "b").await.unwrap_err();
    assert!(matches!(err, MetadataError::HttpError { status: 503, .. }));
}
