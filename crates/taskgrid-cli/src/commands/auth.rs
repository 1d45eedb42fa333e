//! Session commands: sign-in, registration, sign-out and the client directory.

use taskgrid_api_models::{LoginRequest, RegisterClientRequest, RegisterUserRequest};
use taskgrid_store::Session;

use crate::cli::{LoginArgs, RegisterArgs, RegisterClientArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{clients_table, emit, session_table};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let request = LoginRequest {
        email: args.email,
        password: args.password,
    };
    let session = ctx
        .auth
        .login(&request)
        .await
        .map_err(|err| ctx.reported(&err))?;
    render_session(ctx, &session)
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let request = RegisterUserRequest {
        client_id: args.client_id,
        email: args.email,
        display_name: args.display_name,
        password: args.password,
    };
    let session = ctx
        .auth
        .register(&request)
        .await
        .map_err(|err| ctx.reported(&err))?;
    render_session(ctx, &session)
}

pub(crate) async fn handle_register_client(
    ctx: &AppContext,
    args: RegisterClientArgs,
) -> CliResult<()> {
    let request = RegisterClientRequest {
        client_name: args.name,
        username: args.username,
        password: args.password,
    };
    let session = ctx
        .auth
        .register_client(&request)
        .await
        .map_err(|err| ctx.reported(&err))?;
    render_session(ctx, &session)
}

pub(crate) fn handle_logout(ctx: &AppContext) {
    ctx.auth.logout();
}

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let session = ctx
        .auth
        .snapshot()
        .session
        .ok_or_else(|| CliError::validation("not logged in"))?;
    render_session(ctx, &session)
}

pub(crate) async fn handle_clients(ctx: &AppContext) -> CliResult<()> {
    let clients = ctx
        .auth
        .list_clients()
        .await
        .map_err(|err| ctx.reported(&err))?;
    emit(ctx.output, clients.as_slice(), clients_table)
}

fn render_session(ctx: &AppContext, session: &Session) -> CliResult<()> {
    emit(ctx.output, session, session_table)
}
