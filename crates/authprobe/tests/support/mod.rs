//! Scripted stand-in for the application and the three identity providers.
//!
//! Screens carry the same locators the page objects use; reactions model the
//! server side (redirects, rejected credentials, code validation).

#![allow(dead_code)]

use authprobe::mock::{MockDriver, MockElement, MockEndpoint, MockPage};
use authprobe::pages::email_verification::{code_box, error_boxes};
use authprobe::{AriaRole, Locator, ProbeResult, Settings, Timeouts, UrlPattern, CODE_LENGTH};
use std::path::Path;

pub const APP: &str = "https://app.insomnia.rest";
pub const API: &str = "https://api.insomnia.rest";
pub const DASHBOARD: &str = "https://app.insomnia.rest/app/dashboard";

pub const VALID_CODE: &str = "424242";
pub const OKTA_USER: &str = "authprobe@konghq.com";
pub const OKTA_PASSWORD: &str = "correct-horse";
pub const GOOGLE_KNOWN: &str = "authprobe@gmail.com";

pub fn settings(screenshot_dir: &Path) -> Settings {
    Settings::new()
        .with_timeouts(Timeouts::uniform(200, 5))
        .with_screenshot_dir(screenshot_dir)
}

pub fn button(name: &str) -> Locator {
    Locator::role(AriaRole::Button).name(name)
}

pub fn textbox(name: &str) -> Locator {
    Locator::role(AriaRole::Textbox).name(name)
}

pub fn link(name: &str) -> Locator {
    Locator::role(AriaRole::Link).name(name)
}

pub fn img(name: &str) -> Locator {
    Locator::role(AriaRole::Img).name(name)
}

pub fn auth_header() -> Locator {
    Locator::new("div[class=\"flex items-center\"]")
}

pub fn wrong_code_message() -> Locator {
    Locator::text("Wrong email or verification code.")
}

pub fn okta_alert() -> Locator {
    Locator::new("div[role=\"alert\"].infobox-error")
}

/// The whole login journey
pub fn fake_app() -> MockDriver {
    let mut driver = MockDriver::new();
    for endpoint in endpoints() {
        driver = driver.with_endpoint(endpoint);
    }
    driver
}

/// The login journey with `replacement` taking precedence over the stock
/// endpoint for the same URLs
pub fn fake_app_with(replacement: MockEndpoint) -> MockDriver {
    let mut driver = MockDriver::new().with_endpoint(replacement);
    for endpoint in endpoints() {
        driver = driver.with_endpoint(endpoint);
    }
    driver
}

fn endpoints() -> Vec<MockEndpoint> {
    vec![
        MockEndpoint::new(UrlPattern::exact(format!("{APP}/")))
            .redirect(&format!("{APP}/app/authorize")),
        email_screen(),
        authorize_screen(),
        MockEndpoint::new(UrlPattern::glob(format!("{DASHBOARD}**")))
            .with_element(MockElement::new(Locator::text("Dashboard"))),
        MockEndpoint::new(UrlPattern::glob(format!("{API}/oauth/github/authorize?client_id**")))
            .redirect("https://github.com/login?client_id=insomnia&return_to=%2Flogin%2Foauth"),
        MockEndpoint::new(UrlPattern::glob(format!("{API}/oauth/google/authorize?client_id**")))
            .redirect("https://accounts.google.com/v3/signin/identifier?client_id=insomnia"),
        MockEndpoint::new(UrlPattern::glob(format!("{API}/oauth/sso/authorize?client_id**")))
            .redirect("https://konghq.okta.com/login/login.htm?fromURI=%2Foauth2"),
        github_screen(),
        google_identifier_screen(),
        MockEndpoint::new(UrlPattern::glob("https://accounts.google.com/v3/signin/challenge/**")),
        MockEndpoint::new(UrlPattern::glob("https://accounts.google.com/lifecycle/flows/signup**"))
            .redirect("https://accounts.google.com/lifecycle/steps/signup/name?TL=1"),
        google_name_screen(),
        MockEndpoint::new(UrlPattern::glob(
            "https://accounts.google.com/lifecycle/steps/signup/birthdaygender**",
        ))
        .with_element(MockElement::new(Locator::text("Enter your birthday and gender").exact())),
        okta_screen(),
    ]
}

/// Clicking a provider button the first time reveals its input; once the
/// input holds a value the click submits
fn reveal_then(
    input: Locator,
    submit: impl Fn(&mut MockPage, String) -> ProbeResult<()> + Send + Sync + 'static,
) -> impl Fn(&mut MockPage) -> ProbeResult<()> + Send + Sync + 'static {
    move |page| match page.value_of(&input).map(str::to_string) {
        Some(value) if !value.is_empty() => submit(page, value),
        _ => {
            page.set_visible(&input, true);
            Ok(())
        }
    }
}

pub fn authorize_screen() -> MockEndpoint {
    let email_input = textbox("Email Email *");
    let company_input = textbox("Company Email Company Email *");
    MockEndpoint::new(UrlPattern::glob("**/app/authorize"))
        .with_element(MockElement::new(auth_header()))
        .with_element(MockElement::new(auth_header()))
        .with_element(
            MockElement::new(button("Continue with GitHub"))
                .on_click(|page| page.navigate(&format!("{API}/oauth/github/authorize?client_id=gh"))),
        )
        .with_element(
            MockElement::new(button("Continue with Google"))
                .on_click(|page| page.navigate(&format!("{API}/oauth/google/authorize?client_id=go"))),
        )
        .with_element(MockElement::new(button("Continue with Email")).on_click(reveal_then(
            email_input.clone(),
            |page, email| {
                page.navigate(&format!("{APP}/app/authorize/email"))?;
                page.add_element(MockElement::new(Locator::text(format!("{email}."))));
                Ok(())
            },
        )))
        .with_element(MockElement::new(button("Continue with Enterprise SSO")).on_click(
            reveal_then(company_input.clone(), |page, _| {
                page.navigate(&format!("{API}/oauth/sso/authorize?client_id=kong"))
            }),
        ))
        .with_element(MockElement::new(email_input).hidden())
        .with_element(MockElement::new(company_input).hidden())
}

fn check_code(page: &mut MockPage) -> ProbeResult<()> {
    let code: String = (1..=CODE_LENGTH)
        .map(|i| page.value_of(&code_box(i)).unwrap_or_default().to_string())
        .collect();
    if code.len() != CODE_LENGTH {
        return Ok(());
    }
    if code == VALID_CODE {
        return page.navigate(DASHBOARD);
    }
    page.remove_elements(&wrong_code_message());
    page.remove_elements(&error_boxes());
    page.add_element(MockElement::new(wrong_code_message()));
    for _ in 0..CODE_LENGTH {
        page.add_element(MockElement::new(error_boxes()));
    }
    Ok(())
}

pub fn email_screen() -> MockEndpoint {
    let mut endpoint = MockEndpoint::new(UrlPattern::glob("**/app/authorize/email"))
        .with_element(MockElement::new(Locator::text("Check your email")))
        .with_element(MockElement::new(Locator::text("We've sent a verification email to")))
        .with_element(MockElement::new(Locator::text(
            "Enter code manually or click on the link in the email.",
        )))
        .with_element(
            MockElement::new(link("Go Back"))
                .on_click(|page| page.navigate(&format!("{APP}/app/authorize"))),
        );
    for index in 1..=CODE_LENGTH {
        endpoint = endpoint.with_element(MockElement::new(code_box(index)).on_fill(check_code));
    }
    endpoint
}

fn github_screen() -> MockEndpoint {
    MockEndpoint::new(UrlPattern::glob("https://github.com/login**"))
        .with_element(MockElement::new(Locator::new("#login")))
        .with_element(MockElement::new(link("Homepage")))
        .with_element(MockElement::new(img("Insomnia logo")))
        .with_element(MockElement::new(Locator::text("Sign in to GitHub to continue")))
        .with_element(MockElement::new(textbox("Username or email address")))
        .with_element(MockElement::new(textbox("Password")))
        .with_element(
            MockElement::new(button("Sign in").exact()).on_click(|page| {
                page.add_element(MockElement::new(Locator::text(
                    "Incorrect username or password.",
                )));
                Ok(())
            }),
        )
        .with_element(MockElement::new(link("Forgot password?")))
        .with_element(MockElement::new(button("Sign in with a passkey")))
        .with_element(MockElement::new(link("Create an account")))
}

fn google_identifier_screen() -> MockEndpoint {
    let email_input = textbox("Email or phone");
    MockEndpoint::new(UrlPattern::glob(
        "https://accounts.google.com/v3/signin/identifier**",
    ))
    .with_element(MockElement::new(img("Insomnia")))
    .with_element(MockElement::new(email_input.clone()))
    .with_element(MockElement::new(button("Forgot email?")))
    .with_element(
        MockElement::new(button("Create account")).on_click(|page| {
            page.navigate("https://accounts.google.com/lifecycle/flows/signup?flowName=GlifWebSignIn")
        }),
    )
    .with_element(MockElement::new(button("Next")).on_click(move |page| {
        let email = page.value_of(&email_input).unwrap_or_default().to_string();
        if email == GOOGLE_KNOWN {
            return page.navigate("https://accounts.google.com/v3/signin/challenge/pwd");
        }
        page.add_element(MockElement::new(
            Locator::text("Unable to find your Google Account").exact(),
        ));
        Ok(())
    }))
}

fn google_name_screen() -> MockEndpoint {
    let first = textbox("First name");
    let last = textbox("Last name");
    let (first_name, last_name) = (first.clone(), last.clone());
    MockEndpoint::new(UrlPattern::glob(
        "https://accounts.google.com/lifecycle/steps/signup/name**",
    ))
    .with_element(MockElement::new(Locator::text("Create a Google Account").exact()))
    .with_element(MockElement::new(first))
    .with_element(MockElement::new(last))
    .with_element(MockElement::new(button("Next")).on_click(move |page| {
        let named = [&first_name, &last_name]
            .iter()
            .all(|l| page.value_of(l).is_some_and(|v| !v.is_empty()));
        if named {
            page.navigate("https://accounts.google.com/lifecycle/steps/signup/birthdaygender?TL=1")
        } else {
            Ok(())
        }
    }))
}

fn okta_screen() -> MockEndpoint {
    let username = Locator::new("#okta-signin-username");
    let password = Locator::new("#okta-signin-password");
    let (user_field, password_field) = (username.clone(), password.clone());
    MockEndpoint::new(UrlPattern::glob(
        "https://konghq.okta.com/login/login.htm**",
    ))
    .with_element(MockElement::new(img("Kong logo logo")))
    .with_element(MockElement::new(username))
    .with_element(MockElement::new(password))
    .with_element(MockElement::new(Locator::new("input[type=\"checkbox\"]")).checkbox(false))
    .with_element(
        MockElement::new(button("Sign in").exact()).on_click(move |page| {
            let user = page.value_of(&user_field).unwrap_or_default().to_string();
            let pass = page.value_of(&password_field).unwrap_or_default().to_string();
            if user == OKTA_USER && pass == OKTA_PASSWORD {
                return page.navigate(DASHBOARD);
            }
            page.remove_elements(&okta_alert());
            page.add_element(MockElement::new(okta_alert()).with_text("Unable to sign in"));
            Ok(())
        }),
    )
}
