use indexmap::IndexMap;
use log::{debug, info};

use super::params::validate_params;
use super::session::Session;
use super::types::{JobInfo, ParameterDefinitions};
use super::urls::JobUrl;
use crate::error::{LauncherError, Result};

/// Reads the job's declared parameters. Always fetched fresh, since the job
/// configuration may change between runs.
pub async fn fetch_parameter_definitions(
    session: &Session,
    job: &JobUrl,
) -> Result<ParameterDefinitions> {
    let info: JobInfo = session.get_json(&job.api_json()).await?;
    let definitions = info.parameter_definitions();
    debug!("Job {job} declares {} parameters", definitions.len());
    Ok(definitions)
}

/// Submits a build and returns the queue item URL Jenkins hands back.
///
/// Parameterized jobs are always submitted to `buildWithParameters`, even
/// with no values supplied, so that their defaults apply.
///
/// # Errors
///
/// Returns a validation error before anything is submitted if `params`
/// don't fit the job, and a protocol error if the response carries no
/// usable queue location.
pub async fn launch_build(
    session: &Session,
    job: &JobUrl,
    params: &IndexMap<String, String>,
) -> Result<String> {
    let definitions = fetch_parameter_definitions(session, job).await?;
    validate_params(&definitions, params)?;

    let url = job.build_endpoint(!definitions.is_empty());
    info!("Sending build request to {url}");
    let response = session.post_form(&url, params).await?;

    let location = response
        .headers
        .get("Location")
        .ok_or_else(|| LauncherError::Protocol("no Location header in build response".to_string()))?;

    if !location.contains("/queue/") {
        return Err(LauncherError::Protocol(format!(
            "'{location}' is not a queue item"
        )));
    }

    Ok(location.to_string())
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::auth::Credentials;
    use crate::jenkins::session::TransportSettings;

    const PARAMETERIZED: &str = r#"{
        "property": [{
            "_class": "hudson.model.ParametersDefinitionProperty",
            "parameterDefinitions": [
                {"name": "target", "choices": ["dev", "prod"]},
                {"name": "message"}
            ]
        }]
    }"#;

    async fn setup(server: &mockito::Server) -> (Session, JobUrl) {
        let job = JobUrl::parse(&format!("{}/job/a", server.url())).unwrap();
        let settings = TransportSettings {
            fetch_crumb: false,
            ..TransportSettings::default()
        };
        let session = Session::new(&job, &Credentials::new("user", "token"), &settings)
            .await
            .unwrap();
        (session, job)
    }

    #[tokio::test]
    async fn test_unparameterized_job_uses_build_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body(r#"{"property": []}"#)
            .create_async()
            .await;
        let build = server
            .mock("POST", "/job/a/build")
            .with_status(201)
            .with_header("location", "http://h/queue/item/12/")
            .expect(1)
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let location = launch_build(&session, &job, &IndexMap::new()).await.unwrap();

        assert_eq!(location, "http://h/queue/item/12/");
        build.assert_async().await;
    }

    #[tokio::test]
    async fn test_parameterized_job_without_values_uses_build_with_parameters() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body(PARAMETERIZED)
            .create_async()
            .await;
        let build = server
            .mock("POST", "/job/a/buildWithParameters")
            .match_body("")
            .with_status(201)
            .with_header("Location", "http://h/queue/item/13/")
            .expect(1)
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let location = launch_build(&session, &job, &IndexMap::new()).await.unwrap();

        assert_eq!(location, "http://h/queue/item/13/");
        build.assert_async().await;
    }

    #[tokio::test]
    async fn test_parameters_are_form_encoded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body(PARAMETERIZED)
            .create_async()
            .await;
        let build = server
            .mock("POST", "/job/a/buildWithParameters")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("target".into(), "prod".into()),
                Matcher::UrlEncoded("message".into(), "hello world".into()),
            ]))
            .with_status(201)
            .with_header("Location", "http://h/queue/item/14/")
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let params: IndexMap<String, String> = [
            ("target".to_string(), "prod".to_string()),
            ("message".to_string(), "hello world".to_string()),
        ]
        .into_iter()
        .collect();
        launch_build(&session, &job, &params).await.unwrap();

        build.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_parameters_never_submit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body(PARAMETERIZED)
            .create_async()
            .await;
        let build = server
            .mock("POST", "/job/a/buildWithParameters")
            .expect(0)
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let params: IndexMap<String, String> =
            [("target".to_string(), "staging".to_string())].into_iter().collect();
        let error = launch_build(&session, &job, &params).await.unwrap_err();

        assert!(matches!(error, LauncherError::Validation(_)));
        build.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_or_foreign_location_is_a_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body("{}")
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/job/a/build")
            .with_status(201)
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let error = launch_build(&session, &job, &IndexMap::new()).await.unwrap_err();
        assert!(matches!(error, LauncherError::Protocol(_)));

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/job/a/api/json")
            .with_body("{}")
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/job/a/build")
            .with_status(201)
            .with_header("Location", "http://h/login")
            .create_async()
            .await;

        let (session, job) = setup(&server).await;
        let error = launch_build(&session, &job, &IndexMap::new()).await.unwrap_err();
        assert!(matches!(error, LauncherError::Protocol(_)));
    }
}
