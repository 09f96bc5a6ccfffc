use axum::http::{StatusCode, header};

mod common;

use common::{PASSWORD, TestApp, body_text, location, page_get, page_post};

mod login_required {
    use super::*;

    #[tokio::test]
    async fn task_pages_redirect_to_login_with_next() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let task = app.task(&alice, "Alice task", 1, false).await;

        let cases = [
            ("GET", "/".to_string(), "/login/?next=%2F"),
            ("GET", "/task/create/".to_string(), "/login/?next=%2Ftask%2Fcreate%2F"),
            ("POST", "/task/create/".to_string(), "/login/?next=%2Ftask%2Fcreate%2F"),
            (
                "GET",
                format!("/task/{}/update/", task.id),
                "/login/?next=%2Ftask%2F",
            ),
            (
                "POST",
                format!("/task/{}/delete/", task.id),
                "/login/?next=%2Ftask%2F",
            ),
        ];

        for (method, path, expected) in cases {
            let request = match method {
                "GET" => page_get(&path, None),
                _ => page_post(&path, None, "title=x&due_date=2030-01-01"),
            };
            let response = app.send(request).await;
            assert_eq!(response.status(), StatusCode::FOUND, "{} {}", method, path);
            assert!(
                location(&response).starts_with(expected),
                "{} {} redirected to {}",
                method,
                path,
                location(&response)
            );
        }

        assert!(app.state.db.tasks(&alice.id).get(&task.id).await.is_ok());
    }

    #[tokio::test]
    async fn garbage_cookie_is_treated_as_anonymous() {
        let app = TestApp::new().await;
        let response = app.send(page_get("/", Some("auth_token=garbage"))).await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn login_and_signup_pages_are_public() {
        let app = TestApp::new().await;
        for path in ["/login/", "/signup/"] {
            let response = app.send(page_get(path, None)).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
        }
    }
}

mod accounts {
    use super::*;

    #[tokio::test]
    async fn login_sets_session_cookie_and_follows_next() {
        let app = TestApp::new().await;
        app.user("alice").await;

        let form = format!("username=alice&password={}&next=%2Ftask%2Fcreate%2F", PASSWORD);
        let response = app.send(page_post("/login/", None, &form)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/task/create/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("auth_token="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn login_ignores_offsite_next() {
        let app = TestApp::new().await;
        app.user("alice").await;

        let form = format!(
            "username=alice&password={}&next=https%3A%2F%2Fevil.example%2F",
            PASSWORD
        );
        let response = app.send(page_post("/login/", None, &form)).await;

        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn login_ignores_backslash_next() {
        let app = TestApp::new().await;
        app.user("alice").await;

        for next in ["%2F%5Cevil.example", "%2F%5C%2Fevil.example", "%2F%09%2Fevil.example"] {
            let form = format!("username=alice&password={}&next={}", PASSWORD, next);
            let response = app.send(page_post("/login/", None, &form)).await;
            assert_eq!(location(&response), "/", "next={}", next);
        }
    }

    #[tokio::test]
    async fn login_with_wrong_password_rerenders_form() {
        let app = TestApp::new().await;
        app.user("alice").await;

        let response = app
            .send(page_post("/login/", None, "username=alice&password=nope"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response)
            .await
            .contains("Please enter a correct username and password."));
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;

        let response = app
            .send(page_post("/logout/", Some(&app.cookie(&alice)), ""))
            .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/login/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("auth_token="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn signup_creates_account_and_redirects_to_login() {
        let app = TestApp::new().await;

        let response = app
            .send(page_post(
                "/signup/",
                None,
                "username=newuser&email=newuser%40example.com&password1=newpass123&password2=newpass123",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/login/");
        let user = app
            .state
            .db
            .users()
            .authenticate("newuser", "newpass123")
            .await
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("newuser@example.com"));
    }

    #[tokio::test]
    async fn signup_password_mismatch_rerenders_form() {
        let app = TestApp::new().await;

        let response = app
            .send(page_post(
                "/signup/",
                None,
                "username=newuser&email=&password1=newpass123&password2=differentpass",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("fields didn"));
        assert!(
            app.state
                .db
                .users()
                .find_by_username("newuser")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn signup_duplicate_username_rerenders_form() {
        let app = TestApp::new().await;
        app.user("alice").await;

        let response = app
            .send(page_post(
                "/signup/",
                None,
                "username=alice&email=&password1=newpass123&password2=newpass123",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("A user with that username already exists."));
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn list_shows_only_own_tasks_and_stats() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let bob = app.user("bob").await;
        app.task(&alice, "Alice overdue", -2, false).await;
        app.task(&alice, "Alice done", 3, true).await;
        app.task(&bob, "Bob private", 1, false).await;

        let response = app.send(page_get("/", Some(&app.cookie(&alice)))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Alice overdue"));
        assert!(html.contains("Alice done"));
        assert!(!html.contains("Bob private"));
        assert!(html.contains(r#"<strong id="stat-total">2</strong>"#));
        assert!(html.contains(r#"<strong id="stat-overdue">1</strong>"#));
        assert!(html.contains("(overdue)"));
    }

    #[tokio::test]
    async fn list_applies_search() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        app.task(&alice, "Buy milk", 1, false).await;
        app.task(&alice, "Walk dog", 1, false).await;

        let response = app
            .send(page_get("/?search=MILK", Some(&app.cookie(&alice))))
            .await;

        let html = body_text(response).await;
        assert!(html.contains("Buy milk"));
        assert!(!html.contains("Walk dog"));
    }

    #[tokio::test]
    async fn invalid_filter_rerenders_with_message_and_empty_list() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        app.task(&alice, "Visible task", 1, false).await;

        let response = app
            .send(page_get("/?completed=maybe", Some(&app.cookie(&alice))))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Must be a valid boolean."));
        assert!(!html.contains("Visible task"));
        assert!(html.contains("No tasks found."));
    }

    #[tokio::test]
    async fn create_task_through_form() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let due = app.days_from_today(5);

        let form = format!("title=New+task&description=Some+notes&due_date={}", due);
        let response = app
            .send(page_post("/task/create/", Some(&app.cookie(&alice)), &form))
            .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");
        let tasks = app.state.db.tasks(&alice.id).all().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "New task");
        assert_eq!(tasks[0].due_date, due);
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn create_with_invalid_fields_rerenders_form() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;

        let response = app
            .send(page_post(
                "/task/create/",
                Some(&app.cookie(&alice)),
                "title=&due_date=tomorrow",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("This field is required."));
        assert!(html.contains("Enter a valid date."));
        assert!(app.state.db.tasks(&alice.id).all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_task_through_form() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let task = app.task(&alice, "Old title", 1, false).await;
        let path = format!("/task/{}/update/", task.id);
        let cookie = app.cookie(&alice);

        let response = app.send(page_get(&path, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Old title"));

        let form = format!("title=New+title&description=&due_date={}&completed=on", task.due_date);
        let response = app.send(page_post(&path, Some(&cookie), &form)).await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let stored = app.state.db.tasks(&alice.id).get(&task.id).await.unwrap();
        assert_eq!(stored.title, "New title");
        assert!(stored.completed);
        assert_eq!(stored.created_at, task.created_at);
        assert_eq!(stored.owner, alice.id);
    }

    #[tokio::test]
    async fn update_with_completed_false_leaves_task_open() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let task = app.task(&alice, "Still open", 1, false).await;
        let path = format!("/task/{}/update/", task.id);

        let form = format!("title=Still+open&description=&due_date={}&completed=false", task.due_date);
        let response = app
            .send(page_post(&path, Some(&app.cookie(&alice)), &form))
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let stored = app.state.db.tasks(&alice.id).get(&task.id).await.unwrap();
        assert!(!stored.completed);
    }

    #[tokio::test]
    async fn delete_task_after_confirmation() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let task = app.task(&alice, "Doomed", 1, false).await;
        let path = format!("/task/{}/delete/", task.id);
        let cookie = app.cookie(&alice);

        let response = app.send(page_get(&path, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Are you sure"));

        let response = app.send(page_post(&path, Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(app.state.db.tasks(&alice.id).all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_task_pages_are_not_found() {
        let app = TestApp::new().await;
        let alice = app.user("alice").await;
        let bob = app.user("bob").await;
        let task = app.task(&alice, "Alice only", 1, false).await;
        let cookie = app.cookie(&bob);

        for path in [
            format!("/task/{}/update/", task.id),
            format!("/task/{}/delete/", task.id),
        ] {
            let response = app.send(page_get(&path, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", path);

            let form = "title=Hijacked&due_date=2030-01-01";
            let response = app.send(page_post(&path, Some(&cookie), form)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "POST {}", path);
        }

        let stored = app.state.db.tasks(&alice.id).get(&task.id).await.unwrap();
        assert_eq!(stored, task);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found_page() {
        let app = TestApp::new().await;
        let response = app.send(page_get("/nowhere/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Not found"));
    }
}
